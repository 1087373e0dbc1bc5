//! Fuzzy scorer and multi-level autocomplete candidate generation over
//! the command registry.
//!
//! The scorer is this subsystem's own invention (the closest available
//! grounding in the corpus, `SubagentRegistry::find_best_match`, uses a
//! coarser keyword-overlap heuristic); it is implemented here exactly
//! to the algorithm this crate's own specification names, since that
//! algorithm is precise enough to implement to the letter rather than
//! adapt from a looser analog.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub score: i64,
    /// Half-open, merged-consecutive char-index ranges into `target`.
    pub ranges: Vec<(usize, usize)>,
}

/// Score `query` (assumed already lowercase) against `target`.
/// `None` means no match (not every query character was found, in
/// order, in `target`).
pub fn fuzzy_score(query: &str, target: &str) -> Option<FuzzyMatch> {
    if query.is_empty() {
        return Some(FuzzyMatch {
            score: 0,
            ranges: Vec::new(),
        });
    }

    let target_lower = target.to_lowercase();
    let q_chars: Vec<char> = query.chars().collect();
    let t_chars: Vec<char> = target_lower.chars().collect();

    if target_lower == query {
        return Some(FuzzyMatch {
            score: 100 + 10 * q_chars.len() as i64,
            ranges: vec![(0, t_chars.len())],
        });
    }

    if target_lower.starts_with(query) {
        let score = 80 + 10 * q_chars.len() as i64 - (t_chars.len() as i64 - q_chars.len() as i64);
        return Some(FuzzyMatch {
            score,
            ranges: vec![(0, q_chars.len())],
        });
    }

    scan_match(&q_chars, &t_chars)
}

fn scan_match(q_chars: &[char], t_chars: &[char]) -> Option<FuzzyMatch> {
    let mut qi = 0usize;
    let mut score: i64 = 0;
    let mut started = false;
    let mut last_match: Option<usize> = None;
    let mut run_length: i64 = 0;
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let mut current_range: Option<(usize, usize)> = None;

    for (i, &ch) in t_chars.iter().enumerate() {
        if qi < q_chars.len() && ch == q_chars[qi] {
            let at_boundary = i == 0 || t_chars[i - 1] == '-' || t_chars[i - 1] == '_';
            let boundary_bonus = if at_boundary { 3 } else { 0 };
            let consecutive = i > 0 && last_match == Some(i - 1);
            run_length = if consecutive { run_length + 1 } else { 1 };
            let consecutive_bonus = if consecutive { (run_length + 1).min(5) } else { 1 };
            score += 10 + boundary_bonus + consecutive_bonus;

            current_range = match current_range {
                Some((start, end)) if end == i => Some((start, i + 1)),
                Some(finished) => {
                    ranges.push(finished);
                    Some((i, i + 1))
                }
                None => Some((i, i + 1)),
            };

            last_match = Some(i);
            qi += 1;
            started = true;
            if qi == q_chars.len() {
                break;
            }
        } else if started {
            score -= 1;
        }
    }

    if let Some(range) = current_range {
        ranges.push(range);
    }

    if qi < q_chars.len() {
        return None;
    }

    Some(FuzzyMatch { score, ranges })
}

/// A single autocomplete candidate with its match quality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub label: String,
    pub score: i64,
    pub ranges: Vec<(usize, usize)>,
}

/// Level 1: score every command name, plus every alias (keeping the
/// better of the two per command), sorted by score desc then name asc.
pub fn level1_candidates(
    query: &str,
    commands: &[(String, Vec<String>)],
) -> Vec<Candidate> {
    let query = query.to_lowercase();
    let mut candidates = Vec::new();

    for (name, aliases) in commands {
        let mut best: Option<FuzzyMatch> = fuzzy_score(&query, name);
        for alias in aliases {
            if let Some(alias_match) = fuzzy_score(&query, alias) {
                let better = match &best {
                    Some(current) => alias_match.score > current.score,
                    None => true,
                };
                if better {
                    best = Some(alias_match);
                }
            }
        }
        if let Some(matched) = best {
            candidates.push(Candidate {
                label: name.clone(),
                score: matched.score,
                ranges: matched.ranges,
            });
        }
    }

    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    candidates
}

/// Level 2: sub-command candidates for `/<cmd> <partial>`, surfaced as
/// `"<cmd> <sub>"`.
pub fn level2_candidates(
    command_name: &str,
    sub_query: &str,
    sub_commands: &HashMap<String, Vec<String>>,
) -> Vec<Candidate> {
    let Some(subs) = sub_commands.get(command_name) else {
        return Vec::new();
    };
    let query = sub_query.to_lowercase();
    let mut candidates: Vec<Candidate> = subs
        .iter()
        .filter_map(|sub| {
            fuzzy_score(&query, sub).map(|matched| Candidate {
                label: format!("{command_name} {sub}"),
                score: matched.score,
                ranges: matched.ranges,
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    candidates
}

/// Level 3: positional argument candidates for a small closed set of
/// `(command, sub_command)` pairs, e.g. `lsp install <server>`.
pub fn level3_candidates(
    known_values: &[String],
    partial: &str,
) -> Vec<Candidate> {
    let query = partial.to_lowercase();
    let mut candidates: Vec<Candidate> = known_values
        .iter()
        .filter_map(|value| {
            fuzzy_score(&query, value).map(|matched| Candidate {
                label: value.clone(),
                score: matched.score,
                ranges: matched.ranges,
            })
        })
        .collect();
    candidates.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
    candidates
}

/// Autocomplete panel state machine (see `AutocompleteIndex::dispatch`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutocompleteState {
    Idle,
    Active { query: String, candidates: Vec<Candidate>, selected: usize },
}

#[derive(Debug, Clone)]
pub enum AutocompleteEvent {
    InputChange(String),
    SelectPrev,
    SelectNext,
    TabComplete,
    Cancel,
}

pub struct AutocompleteIndex {
    pub state: AutocompleteState,
    commands: Vec<(String, Vec<String>)>,
}

impl AutocompleteIndex {
    pub fn new(commands: Vec<(String, Vec<String>)>) -> Self {
        Self {
            state: AutocompleteState::Idle,
            commands,
        }
    }

    /// Drive the panel's state machine. Returns the selected candidate
    /// on `TabComplete`, else `None`.
    pub fn dispatch(&mut self, event: AutocompleteEvent) -> Option<Candidate> {
        match event {
            AutocompleteEvent::InputChange(query) => {
                if query.is_empty() {
                    self.state = AutocompleteState::Idle;
                } else {
                    let candidates = level1_candidates(&query, &self.commands);
                    self.state = AutocompleteState::Active {
                        query,
                        candidates,
                        selected: 0,
                    };
                }
                None
            }
            AutocompleteEvent::SelectPrev => {
                if let AutocompleteState::Active { candidates, selected, .. } = &mut self.state {
                    if !candidates.is_empty() {
                        *selected = (*selected + candidates.len() - 1) % candidates.len();
                    }
                }
                None
            }
            AutocompleteEvent::SelectNext => {
                if let AutocompleteState::Active { candidates, selected, .. } = &mut self.state {
                    if !candidates.is_empty() {
                        *selected = (*selected + 1) % candidates.len();
                    }
                }
                None
            }
            AutocompleteEvent::TabComplete => {
                if let AutocompleteState::Active { candidates, selected, .. } = &self.state {
                    candidates.get(*selected).cloned()
                } else {
                    None
                }
            }
            AutocompleteEvent::Cancel => {
                self.state = AutocompleteState::Idle;
                None
            }
        }
    }
}
