use crate::dependency::DependencyReference;
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

/// Heading that opens the dependency section of an issue body.
const DEPENDENCIES_HEADING: &str = "dependencies";
/// Paragraph labels that introduce the list of blocking issues.
const BLOCKER_LABELS: &[&str] = &["blocked by", "depends on"];

static ISSUE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w/#.-])(?:(?P<repo>[\w.-]+/[\w.-]+))?#(?P<number>\d+)\b")
        .expect("issue reference pattern is valid")
});

#[derive(Default)]
struct SectionState {
    in_dependencies: bool,
    awaiting_list: bool,
    in_blocker_list: bool,
    list_depth: usize,
    /// List depth at which a label written as a list item opened the blocker list.
    nested_blocker_depth: Option<usize>,
    capturing: Option<String>,
    item_label: Option<String>,
    pending_item: Option<String>,
}

/// Extracts the blocking issues declared in the `## Dependencies` section of
/// an issue body.
///
/// Only task-list items under a `Blocked by:` (or `Depends on:`) label are
/// considered; whether the box is ticked does not matter. The label may be a
/// paragraph, a subheading, or a plain list item whose nested list holds the
/// tasks. A body without the section yields an empty vector.
pub fn parse_dependencies(body: &str) -> Vec<DependencyReference> {
    let mut state = SectionState::default();
    let mut references = Vec::new();

    for event in Parser::new_ext(body, Options::ENABLE_TASKLISTS) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                flush_item(&mut state, &mut references);
                state.capturing = Some(String::new());
            }
            Event::End(TagEnd::Heading(level)) => {
                let text = state.capturing.take().unwrap_or_default();
                let is_label = is_blocker_label(&text);
                if level <= HeadingLevel::H2 {
                    state.in_dependencies = level == HeadingLevel::H2
                        && text.trim().eq_ignore_ascii_case(DEPENDENCIES_HEADING);
                }
                state.awaiting_list = state.in_dependencies && is_label;
            }
            Event::Start(Tag::Paragraph) if state.list_depth == 0 => {
                state.capturing = Some(String::new());
            }
            Event::End(TagEnd::Paragraph) if state.list_depth == 0 => {
                let text = state.capturing.take().unwrap_or_default();
                state.awaiting_list = state.in_dependencies && is_blocker_label(&text);
            }
            Event::Start(Tag::List(_)) => {
                flush_item(&mut state, &mut references);
                if state.list_depth == 0 {
                    state.in_blocker_list = state.awaiting_list;
                    state.awaiting_list = false;
                } else if let Some(label) = state.item_label.take() {
                    if !state.in_blocker_list && is_blocker_label(&label) {
                        state.in_blocker_list = true;
                        state.nested_blocker_depth = Some(state.list_depth + 1);
                    }
                }
                state.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                state.list_depth = state.list_depth.saturating_sub(1);
                if state
                    .nested_blocker_depth
                    .is_some_and(|depth| state.list_depth < depth)
                {
                    state.nested_blocker_depth = None;
                    state.in_blocker_list = false;
                }
                if state.list_depth == 0 {
                    state.in_blocker_list = false;
                }
            }
            Event::Start(Tag::Item) => {
                state.item_label = (state.in_dependencies
                    && state.list_depth == 1
                    && !state.in_blocker_list)
                    .then(String::new);
            }
            Event::TaskListMarker(_) if state.in_blocker_list => {
                state.pending_item = Some(String::new());
            }
            Event::TaskListMarker(_) => state.item_label = None,
            Event::End(TagEnd::Item) => {
                flush_item(&mut state, &mut references);
                state.item_label = None;
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(buffer) = text_buffer(&mut state) {
                    buffer.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(buffer) = text_buffer(&mut state) {
                    buffer.push(' ');
                }
            }
            _ => {}
        }
    }
    flush_item(&mut state, &mut references);

    references
}

fn text_buffer(state: &mut SectionState) -> Option<&mut String> {
    state
        .pending_item
        .as_mut()
        .or(state.capturing.as_mut())
        .or(state.item_label.as_mut())
}

fn flush_item(state: &mut SectionState, references: &mut Vec<DependencyReference>) {
    if let Some(text) = state.pending_item.take() {
        if let Some(reference) = parse_reference(&text) {
            references.push(reference);
        }
    }
}

fn is_blocker_label(text: &str) -> bool {
    let label = text.trim().trim_end_matches(':').trim();
    BLOCKER_LABELS
        .iter()
        .any(|candidate| label.eq_ignore_ascii_case(candidate))
}

/// Returns the first issue reference (`#N` or `owner/repo#N`) in `text`.
pub fn parse_reference(text: &str) -> Option<DependencyReference> {
    let captures = ISSUE_REFERENCE.captures(text)?;
    let number = captures.name("number")?.as_str().parse::<u64>().ok()?;
    Some(match captures.name("repo") {
        Some(repo) => DependencyReference::external(repo.as_str(), number),
        None => DependencyReference::local(number),
    })
}
