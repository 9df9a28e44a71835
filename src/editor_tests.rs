use super::*;
use crate::markup;
use crate::viewport::{LineViewport, ViewRect};

fn editor_with(source: &str, settings: Settings) -> Editor {
    let parsed = markup::parse(source).unwrap();
    let editor = Editor::new(parsed.document, settings);
    match parsed.selection {
        Some(selection) => editor.with_selection(selection),
        None => editor,
    }
}

fn editor_for(source: &str) -> Editor {
    editor_with(source, Settings::default())
}

fn soft_breaks() -> Settings {
    Settings::default().with_forced_root_block("")
}

fn press(editor: &mut Editor) -> BreakOutcome {
    editor.handle_enter(&BreakKeyEvent::enter())
}

fn press_shift(editor: &mut Editor) -> BreakOutcome {
    editor.handle_enter(&BreakKeyEvent::shift_enter())
}

fn markup_of(editor: &Editor) -> String {
    markup::serialize(editor.document(), Some(&editor.selection()))
}

#[test]
fn splits_paragraph_in_the_middle() {
    let mut editor = editor_for("<p>ab|cd</p>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::SplitBlock));
    assert_eq!(markup_of(&editor), "<p>ab</p><p>|cd</p>");
}

#[test]
fn middle_split_keeps_formatting_on_both_halves() {
    let mut editor = editor_for("<p>a<b>b|c</b>d</p>");
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<p>a<b>b</b></p><p><b>|c</b>d</p>");
}

#[test]
fn middle_split_drops_id_from_new_half() {
    let mut editor = editor_for(r#"<p id="intro">a|b</p>"#);
    press(&mut editor);
    assert_eq!(markup_of(&editor), r#"<p id="intro">a</p><p>|b</p>"#);
}

#[test]
fn break_in_empty_block_adds_sibling_block() {
    let mut editor = editor_for("<p>|<br></p>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(markup_of(&editor), "<p><br></p><p>|<br></p>");
}

#[test]
fn break_at_end_continues_inline_formatting() {
    let mut editor = editor_for(r#"<p id="a"><b id="x"><i>ab|</i></b></p>"#);
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(
        markup_of(&editor),
        r#"<p id="a"><b id="x"><i>ab</i></b></p><p><b><i>|<br></i></b></p>"#
    );
}

#[test]
fn formatting_around_the_block_is_continued() {
    let mut editor = editor_for("<font><p>ab|</p></font>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(markup_of(&editor), "<font><p>ab</p><p><font>|<br></font></p></font>");
}

#[test]
fn break_at_start_inserts_block_before() {
    let mut editor = editor_for("<h1>|Title</h1>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockBefore));
    assert_eq!(markup_of(&editor), "<h1>|<br></h1><h1>Title</h1>");
}

#[test]
fn whitespace_only_block_keeps_its_whitespace() {
    let mut editor = editor_for("<p>   |</p>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(markup_of(&editor), "<p>   </p><p>|<br></p>");
}

#[test]
fn heading_end_continues_with_paragraph() {
    let mut editor = editor_for("<h1>Title|</h1>");
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<h1>Title</h1><p>|<br></p>");
}

#[test]
fn heading_inside_hgroup_is_not_promoted() {
    let mut editor = editor_for("<hgroup><h1>Title|</h1></hgroup>");
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<hgroup><h1>Title</h1><h1>|<br></h1></hgroup>");
}

#[test]
fn sole_empty_list_item_replaces_list() {
    let mut editor = editor_for("<ul><li>|</li></ul>");
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Sole))
    );
    assert_eq!(markup_of(&editor), "<p>|<br></p>");
}

#[test]
fn first_empty_list_item_moves_before_list() {
    let mut editor = editor_for("<ul><li>|</li><li>b</li></ul>");
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::First))
    );
    assert_eq!(markup_of(&editor), "<p>|<br></p><ul><li>b</li></ul>");
}

#[test]
fn last_empty_list_item_moves_after_list() {
    let mut editor = editor_for("<ul><li>a</li><li>|<br></li></ul>");
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Last))
    );
    assert_eq!(markup_of(&editor), "<ul><li>a</li></ul><p>|<br></p>");
}

#[test]
fn middle_empty_list_item_splits_list() {
    let mut editor = editor_for(r#"<ol id="steps"><li>a</li><li>|</li><li>b</li></ol>"#);
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Middle))
    );
    assert_eq!(
        markup_of(&editor),
        r#"<ol id="steps"><li>a</li></ol><p>|<br></p><ol><li>b</li></ol>"#
    );
}

#[test]
fn empty_list_item_without_forced_tag_becomes_break() {
    let mut editor = editor_with("<ul><li>a</li><li>|</li></ul>", soft_breaks());
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<ul><li>a</li></ul><br>|");
}

#[test]
fn nested_empty_list_item_is_deferred() {
    let source = "<ul><li>a<ul><li>|</li></ul></li></ul>";
    let mut editor = editor_for(source);
    let mut event = BreakKeyEvent::enter();
    assert!(!editor.on_key_down(&mut event));
    assert!(!event.is_default_prevented());
    assert_eq!(markup_of(&editor), source);
    assert_eq!(editor.history().depth(), 0);
}

#[test]
fn non_empty_list_item_splits_into_items() {
    let mut editor = editor_for("<ul><li>a|</li></ul>");
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<ul><li>a</li><li>|<br></li></ul>");
}

#[test]
fn list_items_split_even_without_forced_tag() {
    let mut editor = editor_with("<ul><li>a|b</li></ul>", soft_breaks());
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::SplitBlock));
    assert_eq!(markup_of(&editor), "<ul><li>a</li><li>|b</li></ul>");

    let mut editor = editor_with("<ul><li>a|b</li></ul>", soft_breaks());
    assert_eq!(press_shift(&mut editor), BreakOutcome::Applied(BreakAction::SplitBlock));
    assert_eq!(markup_of(&editor), "<ul><li>a</li><li>|b</li></ul>");
}

#[test]
fn shift_still_leaves_list_through_empty_item() {
    let mut editor = editor_for("<ul><li>a</li><li>|</li></ul>");
    assert_eq!(
        press_shift(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Last))
    );
    assert_eq!(markup_of(&editor), "<ul><li>a</li></ul><p>|<br></p>");

    let mut editor = editor_with("<ul><li>a</li><li>|</li></ul>", soft_breaks());
    assert_eq!(
        press_shift(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Last))
    );
    assert_eq!(markup_of(&editor), "<ul><li>a</li></ul><br>|");
}

#[test]
fn empty_first_and_sole_items_become_breaks_without_forced_tag() {
    let mut editor = editor_with("<ul><li>|</li><li>b</li></ul>", soft_breaks());
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::First))
    );
    assert_eq!(markup_of(&editor), "<br>|<ul><li>b</li></ul>");

    let mut editor = editor_with("<ul><li>|</li></ul>", soft_breaks());
    assert_eq!(
        press(&mut editor),
        BreakOutcome::Applied(BreakAction::ListItem(ListItemPosition::Sole))
    );
    assert_eq!(markup_of(&editor), "<br>|");
}

#[test]
fn list_item_outside_a_list_splits_like_a_block() {
    let mut editor = editor_for("<li>|</li>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(markup_of(&editor), "<li></li><li>|<br></li>");
}

#[test]
fn preformatted_gets_line_breaks() {
    let mut editor = editor_for("<pre>a|b</pre>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::LineBreak));
    assert_eq!(markup_of(&editor), "<pre>a<br>|b</pre>");

    let mut editor = editor_for("<pre>a|b</pre>");
    assert_eq!(press_shift(&mut editor), BreakOutcome::Applied(BreakAction::SplitBlock));
    assert_eq!(markup_of(&editor), "<pre>a</pre><pre>|b</pre>");
}

#[test]
fn shift_at_end_of_preformatted_continues_with_paragraph() {
    let mut editor = editor_for("<pre>ab|</pre>");
    assert_eq!(press_shift(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(markup_of(&editor), "<pre>ab</pre><p>|<br></p>");
}

#[test]
fn preformatted_splits_when_breaks_are_disabled() {
    let settings = Settings {
        break_in_preformatted: false,
        ..Settings::default()
    };
    let mut editor = editor_with("<pre>a|b</pre>", settings.clone());
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<pre>a</pre><pre>|b</pre>");

    let mut editor = editor_with("<pre>a|b</pre>", settings);
    press_shift(&mut editor);
    assert_eq!(markup_of(&editor), "<pre>a<br>|b</pre>");
}

#[test]
fn preformatted_split_trims_leading_line_feeds() {
    let settings = Settings {
        break_in_preformatted: false,
        ..Settings::default()
    };
    let mut editor = editor_with("<pre>a|\nb</pre>", settings);
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<pre>a</pre><pre>|b</pre>");
}

#[test]
fn break_at_end_of_text_adds_trailing_break() {
    let mut editor = editor_with("<p>ab|</p>", soft_breaks());
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::LineBreak));
    assert_eq!(markup_of(&editor), "<p>ab<br>|<br></p>");

    let mut editor = editor_with("<p>ab|<br></p>", soft_breaks());
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<p>ab<br>|<br></p>");
}

#[test]
fn trailing_break_can_be_disabled() {
    let settings = Settings {
        extra_trailing_break: false,
        ..soft_breaks()
    };
    let mut editor = editor_with("<p>ab|</p>", settings);
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<p>ab<br>|</p>");
}

#[test]
fn shift_requests_soft_break_with_forced_tag() {
    let mut editor = editor_for("<p>a|b</p>");
    assert_eq!(press_shift(&mut editor), BreakOutcome::Applied(BreakAction::LineBreak));
    assert_eq!(markup_of(&editor), "<p>a<br>|b</p>");
}

#[test]
fn wraps_loose_text_in_table_cell_before_splitting() {
    let mut editor = editor_for("<table><tr><td>a|b</td></tr></table>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::SplitBlock));
    assert_eq!(
        markup_of(&editor),
        "<table><tr><td><p>a</p><p>|b</p></td></tr></table>"
    );
}

#[test]
fn wraps_loose_text_at_document_root() {
    let mut editor = editor_for("a|b<p>c</p>");
    press(&mut editor);
    assert_eq!(markup_of(&editor), "<p>a</p><p>|b</p><p>c</p>");
}

#[test]
fn empty_document_gets_a_block() {
    let mut editor = editor_for("");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::CreatedRootBlock));
    assert_eq!(markup_of(&editor), "<p>|<br></p>");
}

#[test]
fn empty_block_splits_its_container_when_enabled() {
    let settings = Settings {
        split_container_on_empty_block: true,
        ..Settings::default()
    };
    let mut editor = editor_with("<blockquote><p>a</p><p>|<br></p><p>b</p></blockquote>", settings);
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::SplitContainer));
    assert_eq!(
        markup_of(&editor),
        "<blockquote><p>a</p></blockquote><p>|<br></p><blockquote><p>b</p></blockquote>"
    );
}

#[test]
fn empty_block_stays_in_container_by_default() {
    let mut editor = editor_for("<blockquote><p>a</p><p>|<br></p></blockquote>");
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(
        markup_of(&editor),
        "<blockquote><p>a</p><p><br></p><p>|<br></p></blockquote>"
    );
}

#[test]
fn non_collapsed_selection_is_deleted_without_splitting() {
    let mut editor = editor_for("<p>a[bc]d</p>");
    let mut event = BreakKeyEvent::enter();
    assert!(editor.on_key_down(&mut event));
    assert!(event.is_default_prevented());
    assert_eq!(markup_of(&editor), "<p>a|d</p>");
    assert_eq!(editor.history().depth(), 1);
}

#[test]
fn selection_across_blocks_is_joined() {
    let mut editor = editor_for("<p>a[b</p><p>c]d</p>");
    assert_eq!(press(&mut editor), BreakOutcome::DeletedSelection);
    assert_eq!(markup_of(&editor), "<p>a|d</p>");
}

#[test]
fn deleting_everything_pads_the_block() {
    let mut editor = editor_for("<p>[ab]</p>");
    assert!(editor.exec_command(Command::Delete));
    assert_eq!(markup_of(&editor), "<p>|<br></p>");
}

#[test]
fn prevented_event_is_left_alone() {
    let mut editor = editor_for("<p>ab|cd</p>");
    let mut event = BreakKeyEvent::enter();
    event.prevent_default();
    assert_eq!(
        editor.handle_enter(&event),
        BreakOutcome::Deferred(DeferReason::DefaultPrevented)
    );
    assert_eq!(markup_of(&editor), "<p>ab|cd</p>");
}

#[test]
fn handled_key_prevents_default() {
    let mut editor = editor_for("<p>ab|</p>");
    let mut event = BreakKeyEvent::enter();
    assert!(editor.on_key_down(&mut event));
    assert!(event.is_default_prevented());
}

#[test]
fn repeated_breaks_never_rejoin_the_block() {
    let mut editor = editor_for("<p>ab|cd</p>");
    press(&mut editor);
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockBefore));
    assert_eq!(markup_of(&editor), "<p>ab</p><p>|<br></p><p>cd</p>");
}

#[test]
fn each_break_is_one_undo_step() {
    let mut editor = editor_for("<p>ab|cd</p>");
    press(&mut editor);
    press(&mut editor);
    assert_eq!(editor.history().depth(), 2);

    assert!(editor.undo());
    assert_eq!(markup_of(&editor), "<p>ab</p><p>|cd</p>");
    assert!(editor.undo());
    assert_eq!(markup_of(&editor), "<p>ab|cd</p>");
    assert!(!editor.undo());

    assert!(editor.redo());
    assert_eq!(markup_of(&editor), "<p>ab</p><p>|cd</p>");
}

#[test]
fn typing_after_a_break_lands_in_new_block() {
    let mut editor = editor_for("<p><b>ab|</b></p>");
    press(&mut editor);
    editor.insert_text("c");
    assert_eq!(markup_of(&editor), "<p><b>ab</b></p><p><b>c|<br></b></p>");
}

#[test]
fn new_editor_places_caret_at_first_text() {
    let editor = editor_for("<p><b>xy</b></p>");
    assert_eq!(markup_of(&editor), "<p><b>|xy</b></p>");
}

#[test]
fn rejects_selection_outside_document() {
    let mut editor = editor_for("<p>ab|</p>");
    let before = editor.selection();
    let paragraph = editor.document().first_child(editor.document().root()).unwrap();
    assert!(!editor.set_selection(Range::caret(Position::new(paragraph, 7))));
    assert_eq!(editor.selection(), before);
}

#[test]
fn new_block_below_the_view_scrolls_it_into_view() {
    let mut editor = editor_for("<p>1</p><p>2</p><p>3|</p>")
        .with_viewport(Box::new(LineViewport::new(40, 3)));
    press(&mut editor);
    assert_eq!(editor.viewport().bounds(), Some(ViewRect { y: 1, height: 3 }));
}

#[test]
fn unmeasurable_viewport_does_not_block_the_break() {
    let mut editor = editor_for("<p>1|</p>").with_viewport(Box::new(LineViewport::new(0, 0)));
    assert_eq!(press(&mut editor), BreakOutcome::Applied(BreakAction::BlockAfter));
    assert_eq!(editor.viewport().bounds(), None);
}
