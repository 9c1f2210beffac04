use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::blocks::Block;

static RACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^race\b").unwrap());

const FRAGMENT_SEP: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceHeading {
    pub level: u8,
    pub text: String,
}

/// Lead and Race spans collected from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub lead: Vec<String>,
    pub race: Vec<String>,
    pub race_heading: Option<RaceHeading>,
    pub lead_count: usize,
    pub race_count: usize,
}

impl Sections {
    pub fn lead_html(&self) -> String {
        self.lead.join(FRAGMENT_SEP)
    }

    /// Race heading markup followed by its body, or empty.
    pub fn race_html(&self) -> String {
        self.race.join(FRAGMENT_SEP)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Lead,
    SeekRace,
    InRace { level: u8 },
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Next,
    /// Feed the same block to the new state.
    Reexamine,
}

pub fn is_race_heading(text: &str) -> bool {
    RACE_RE.is_match(text.trim())
}

/// Single pass over the container children.
///
/// Lead paragraphs are taken up to the first level-2 heading. The Race span
/// starts at the first heading whose text begins with "Race" and runs until
/// the next heading at that same level. When the page has no level-2
/// heading at all, the lead swallows everything and the Race search restarts
/// from the top.
pub fn extract_sections(blocks: &[Block]) -> Sections {
    let mut acc = Sections::default();
    let mut state = State::Lead;
    let mut i = 0;

    loop {
        let Some(block) = blocks.get(i) else {
            if state == State::Lead {
                state = State::SeekRace;
                i = 0;
                continue;
            }
            break;
        };

        let (next, flow) = step(state, block, &mut acc);
        state = next;
        if state == State::Done {
            break;
        }
        if flow == Flow::Next {
            i += 1;
        }
    }

    match &acc.race_heading {
        Some(h) => debug!("[race] matched heading='{}' level={}", h.text, h.level),
        None => debug!("[race] no 'Race*' heading found"),
    }
    debug!("[sections] lead={} race={}", acc.lead_count, acc.race_count);

    acc
}

fn step(state: State, block: &Block, acc: &mut Sections) -> (State, Flow) {
    match state {
        State::Lead => match block {
            Block::Heading { level: 2, .. } => (State::SeekRace, Flow::Reexamine),
            Block::Paragraph { html } => {
                acc.lead.push(html.clone());
                acc.lead_count += 1;
                (State::Lead, Flow::Next)
            }
            _ => (State::Lead, Flow::Next),
        },
        State::SeekRace => match block {
            Block::Heading { level, text, html } if is_race_heading(text) => {
                acc.race.push(html.clone());
                acc.race_heading = Some(RaceHeading {
                    level: *level,
                    text: text.clone(),
                });
                (State::InRace { level: *level }, Flow::Next)
            }
            Block::Heading { text, .. } if text.is_empty() => {
                debug!("[race] heading without text skipped");
                (State::SeekRace, Flow::Next)
            }
            _ => (State::SeekRace, Flow::Next),
        },
        State::InRace { level } => match block {
            Block::Heading { level: l, .. } if *l == level => (State::Done, Flow::Next),
            Block::Paragraph { html } => {
                acc.race.push(html.clone());
                acc.race_count += 1;
                (state, Flow::Next)
            }
            other => {
                acc.race.push(other.html().to_string());
                (state, Flow::Next)
            }
        },
        State::Done => (State::Done, Flow::Next),
    }
}
