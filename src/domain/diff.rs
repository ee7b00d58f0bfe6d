//! Character-level text diff with semantic cleanup.
//!
//! The raw edit script comes from Myers' O(ND) algorithm (middle-snake
//! bisection). Raw minimal edit scripts fragment prose into single-character
//! edits, so the script is then cleaned up: short equalities sandwiched
//! between larger edits are folded into the edits, single edits are slid onto
//! word and line boundaries, and overlapping delete/insert pairs are split
//! around their common text.
//!
//! The diff is total: every pair of strings produces a script from which both
//! inputs can be rebuilt. The bisection is bounded by a deadline; a search
//! that runs out of time settles for a coarser script, never a wrong one.

use std::{
    fmt,
    time::{Duration, Instant},
};

/// What a [`Span`] does to the old text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Present in both texts.
    Equal,
    /// Present only in the new text.
    Insert,
    /// Present only in the old text.
    Delete,
}

/// A contiguous run of text with a single [`Operation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// The operation.
    pub operation: Operation,
    /// The text the operation applies to.
    pub text: String,
}

impl Span {
    /// An unchanged span.
    pub fn equal(text: impl Into<String>) -> Self {
        Self {
            operation: Operation::Equal,
            text: text.into(),
        }
    }

    /// An inserted span.
    pub fn insert(text: impl Into<String>) -> Self {
        Self {
            operation: Operation::Insert,
            text: text.into(),
        }
    }

    /// A deleted span.
    pub fn delete(text: impl Into<String>) -> Self {
        Self {
            operation: Operation::Delete,
            text: text.into(),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// How long [`diff`] may search for a minimal edit script.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Computes the diff between `old` and `new`, searching for at most
/// [`DEFAULT_TIMEOUT`].
///
/// Two empty inputs produce a single empty [`Operation::Equal`] span.
#[must_use]
pub fn diff(old: &str, new: &str) -> Vec<Span> {
    diff_with_timeout(old, new, DEFAULT_TIMEOUT)
}

/// Computes the diff between `old` and `new`, searching for at most
/// `timeout`.
///
/// Regions still unresolved when the time runs out are reported as a whole
/// deletion followed by a whole insertion.
#[must_use]
pub fn diff_with_timeout(old: &str, new: &str, timeout: Duration) -> Vec<Span> {
    if old == new {
        return vec![Span::equal(old)];
    }

    let old: Vec<char> = old.chars().collect();
    let new: Vec<char> = new.chars().collect();
    let deadline = Instant::now().checked_add(timeout);

    let mut script = diff_chars(&old, &new, deadline);
    cleanup_semantic(&mut script);

    script
        .into_iter()
        .map(|(operation, text)| Span {
            operation,
            text: text.into_iter().collect(),
        })
        .collect()
}

/// Whether `old` and `new` differ, as judged by the diff itself.
#[must_use]
pub fn has_changed(old: &str, new: &str) -> bool {
    diff(old, new)
        .iter()
        .any(|span| span.operation != Operation::Equal)
}

/// The "before" view: equalities and deletions, insertions omitted.
pub fn deletion_view(spans: &[Span]) -> impl Iterator<Item = &Span> {
    spans
        .iter()
        .filter(|span| span.operation != Operation::Insert)
}

/// The "after" view: equalities and insertions, deletions omitted.
pub fn insertion_view(spans: &[Span]) -> impl Iterator<Item = &Span> {
    spans
        .iter()
        .filter(|span| span.operation != Operation::Delete)
}

/// Rebuilds the old text from a diff.
#[must_use]
pub fn old_text(spans: &[Span]) -> String {
    deletion_view(spans).map(|span| span.text.as_str()).collect()
}

/// Rebuilds the new text from a diff.
#[must_use]
pub fn new_text(spans: &[Span]) -> String {
    insertion_view(spans).map(|span| span.text.as_str()).collect()
}

type Edit = (Operation, Vec<char>);

fn diff_chars(old: &[char], new: &[char], deadline: Option<Instant>) -> Vec<Edit> {
    if old == new {
        return if old.is_empty() {
            Vec::new()
        } else {
            vec![(Operation::Equal, old.to_vec())]
        };
    }

    let prefix = common_prefix(old, new);
    let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);
    let suffix = common_suffix(old_rest, new_rest);
    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    let mut script = Vec::new();
    if prefix > 0 {
        script.push((Operation::Equal, old[..prefix].to_vec()));
    }
    script.extend(compute(old_mid, new_mid, deadline));
    if suffix > 0 {
        script.push((Operation::Equal, old_rest[old_rest.len() - suffix..].to_vec()));
    }

    cleanup_merge(&mut script);
    script
}

/// Diffs two texts that share no common prefix or suffix.
fn compute(old: &[char], new: &[char], deadline: Option<Instant>) -> Vec<Edit> {
    if old.is_empty() {
        return vec![(Operation::Insert, new.to_vec())];
    }
    if new.is_empty() {
        return vec![(Operation::Delete, old.to_vec())];
    }

    let (long, short, operation) = if old.len() > new.len() {
        (old, new, Operation::Delete)
    } else {
        (new, old, Operation::Insert)
    };

    if let Some(start) = find_subslice(long, short) {
        return vec![
            (operation, long[..start].to_vec()),
            (Operation::Equal, short.to_vec()),
            (operation, long[start + short.len()..].to_vec()),
        ];
    }

    if short.len() == 1 {
        return vec![
            (Operation::Delete, old.to_vec()),
            (Operation::Insert, new.to_vec()),
        ];
    }

    bisect(old, new, deadline)
}

/// Finds the middle snake of the edit graph and recurses on both halves.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn bisect(old: &[char], new: &[char], deadline: Option<Instant>) -> Vec<Edit> {
    let old_len = old.len() as isize;
    let new_len = new.len() as isize;
    let max_d = (old_len + new_len + 1) / 2;
    let v_offset = max_d;
    let v_length = 2 * max_d;
    let mut v1 = vec![-1_isize; v_length as usize];
    let mut v2 = vec![-1_isize; v_length as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = old_len - new_len;
    // with an odd delta the forward path is the one that can collide
    let front = delta % 2 != 0;

    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0, 0, 0, 0);

    for d in 0..max_d {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            break;
        }

        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < old_len && y1 < new_len && old[x1 as usize] == new[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;

            if x1 > old_len {
                k1_end += 2;
            } else if y1 > new_len {
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if (0..v_length).contains(&k2_offset) && v2[k2_offset as usize] != -1 {
                    let x2 = old_len - v2[k2_offset as usize];
                    if x1 >= x2 {
                        return bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < old_len
                && y2 < new_len
                && old[(old_len - x2 - 1) as usize] == new[(new_len - y2 - 1) as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;

            if x2 > old_len {
                k2_end += 2;
            } else if y2 > new_len {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if (0..v_length).contains(&k1_offset) && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= old_len - x2 {
                        return bisect_split(old, new, x1 as usize, y1 as usize, deadline);
                    }
                }
            }
            k2 += 2;
        }
    }

    // out of time, or the texts share nothing worth keeping
    vec![
        (Operation::Delete, old.to_vec()),
        (Operation::Insert, new.to_vec()),
    ]
}

fn bisect_split(
    old: &[char],
    new: &[char],
    x: usize,
    y: usize,
    deadline: Option<Instant>,
) -> Vec<Edit> {
    let mut script = diff_chars(&old[..x], &new[..y], deadline);
    script.extend(diff_chars(&old[x..], &new[y..], deadline));
    script
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &[char], b: &[char]) -> usize {
    let max = a.len().min(b.len());
    (1..=max)
        .rev()
        .find(|&k| a[a.len() - k..] == b[..k])
        .unwrap_or(0)
}

fn find_subslice(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn concat(a: &[char], b: &[char]) -> Vec<char> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

/// Merges adjacent edits of the same kind, factors common text out of
/// delete/insert runs, and slides single edits sideways to absorb an
/// adjacent equality where possible.
fn cleanup_merge(script: &mut Vec<Edit>) {
    script.retain(|(_, text)| !text.is_empty());
    // sentinel so the final run is flushed
    script.push((Operation::Equal, Vec::new()));

    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete: Vec<char> = Vec::new();
    let mut text_insert: Vec<char> = Vec::new();

    while pointer < script.len() {
        match script[pointer].0 {
            Operation::Insert => {
                count_insert += 1;
                text_insert.extend_from_slice(&script[pointer].1);
                pointer += 1;
            }
            Operation::Delete => {
                count_delete += 1;
                text_delete.extend_from_slice(&script[pointer].1);
                pointer += 1;
            }
            Operation::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let prefix = common_prefix(&text_insert, &text_delete);
                        if prefix != 0 {
                            let start = pointer - count_delete - count_insert;
                            let common = text_insert[..prefix].to_vec();
                            if start > 0 && script[start - 1].0 == Operation::Equal {
                                script[start - 1].1.extend_from_slice(&common);
                            } else {
                                script.insert(0, (Operation::Equal, common));
                                pointer += 1;
                            }
                            text_insert.drain(..prefix);
                            text_delete.drain(..prefix);
                        }
                        let suffix = common_suffix(&text_insert, &text_delete);
                        if suffix != 0 {
                            let common = text_insert[text_insert.len() - suffix..].to_vec();
                            script[pointer].1 = concat(&common, &script[pointer].1);
                            text_insert.truncate(text_insert.len() - suffix);
                            text_delete.truncate(text_delete.len() - suffix);
                        }
                    }

                    let start = pointer - count_delete - count_insert;
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push((Operation::Delete, std::mem::take(&mut text_delete)));
                    }
                    if !text_insert.is_empty() {
                        merged.push((Operation::Insert, std::mem::take(&mut text_insert)));
                    }
                    let inserted = merged.len();
                    script.splice(start..pointer, merged);
                    pointer = start + inserted + 1;
                } else if pointer != 0 && script[pointer - 1].0 == Operation::Equal {
                    let text = script.remove(pointer).1;
                    script[pointer - 1].1.extend(text);
                } else {
                    pointer += 1;
                }
                count_delete = 0;
                count_insert = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if script.last().is_some_and(|(_, text)| text.is_empty()) {
        script.pop();
    }

    // slide single edits over an adjacent equality, e.g. A<ins>BA</ins>C -> <ins>AB</ins>AC
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < script.len() {
        if script[pointer - 1].0 == Operation::Equal && script[pointer + 1].0 == Operation::Equal {
            let previous = script[pointer - 1].1.clone();
            let current = script[pointer].1.clone();
            let next = script[pointer + 1].1.clone();

            if current.ends_with(&previous) {
                script[pointer].1 = concat(&previous, &current[..current.len() - previous.len()]);
                script[pointer + 1].1 = concat(&previous, &next);
                script.remove(pointer - 1);
                changes = true;
            } else if current.starts_with(&next) {
                script[pointer - 1].1.extend_from_slice(&next);
                script[pointer].1 = concat(&current[next.len()..], &next);
                script.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(script);
    }
}

/// Folds equalities that are no longer than the edits on both sides of them
/// into those edits, then tidies the result.
fn cleanup_semantic(script: &mut Vec<Edit>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    let mut pointer = 0;
    // characters changed before and after the last equality
    let (mut insert_before, mut delete_before) = (0, 0);
    let (mut insert_after, mut delete_after) = (0, 0);

    while pointer < script.len() {
        let (operation, text) = &script[pointer];
        if *operation == Operation::Equal {
            equalities.push(pointer);
            insert_before = insert_after;
            delete_before = delete_after;
            insert_after = 0;
            delete_after = 0;
            last_equality = Some(text.clone());
        } else {
            if *operation == Operation::Insert {
                insert_after += text.len();
            } else {
                delete_after += text.len();
            }

            if let Some(equality) = last_equality.as_ref().filter(|equality| {
                equality.len() <= insert_before.max(delete_before)
                    && equality.len() <= insert_after.max(delete_after)
            }) {
                if let Some(&index) = equalities.last() {
                    script.insert(index, (Operation::Delete, equality.clone()));
                    script[index + 1].0 = Operation::Insert;
                    // the equality just split, and the one before it needs another look
                    equalities.pop();
                    equalities.pop();
                    insert_before = 0;
                    delete_before = 0;
                    insert_after = 0;
                    delete_after = 0;
                    last_equality = None;
                    changes = true;
                    pointer = equalities.last().map_or(0, |&index| index + 1);
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(script);
    }
    cleanup_semantic_lossless(script);
    extract_overlaps(script);
}

/// Splits a delete/insert pair around text that ends one and starts the
/// other, when the shared text is at least half of either edit.
fn extract_overlaps(script: &mut Vec<Edit>) {
    let mut pointer = 1;
    while pointer < script.len() {
        if script[pointer - 1].0 == Operation::Delete && script[pointer].0 == Operation::Insert {
            let deletion = script[pointer - 1].1.clone();
            let insertion = script[pointer].1.clone();
            let forward = common_overlap(&deletion, &insertion);
            let backward = common_overlap(&insertion, &deletion);

            if forward >= backward {
                if forward * 2 >= deletion.len() || forward * 2 >= insertion.len() {
                    script.insert(pointer, (Operation::Equal, insertion[..forward].to_vec()));
                    script[pointer - 1].1 = deletion[..deletion.len() - forward].to_vec();
                    script[pointer + 1].1 = insertion[forward..].to_vec();
                    pointer += 1;
                }
            } else if backward * 2 >= deletion.len() || backward * 2 >= insertion.len() {
                script.insert(pointer, (Operation::Equal, deletion[..backward].to_vec()));
                script[pointer - 1] = (
                    Operation::Insert,
                    insertion[..insertion.len() - backward].to_vec(),
                );
                script[pointer + 1] = (Operation::Delete, deletion[backward..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
    script.retain(|(_, text)| !text.is_empty());
}

/// Slides single edits surrounded by equalities onto the most natural
/// boundary (blank line, line break, sentence end, whitespace, punctuation).
fn cleanup_semantic_lossless(script: &mut Vec<Edit>) {
    let mut pointer = 1;
    while pointer + 1 < script.len() {
        if script[pointer - 1].0 == Operation::Equal && script[pointer + 1].0 == Operation::Equal {
            let mut equality1 = script[pointer - 1].1.clone();
            let mut edit = script[pointer].1.clone();
            let mut equality2 = script[pointer + 1].1.clone();

            // shift the edit as far left as possible
            let offset = common_suffix(&equality1, &edit);
            if offset > 0 {
                let common = edit[edit.len() - offset..].to_vec();
                equality1.truncate(equality1.len() - offset);
                edit = concat(&common, &edit[..edit.len() - offset]);
                equality2 = concat(&common, &equality2);
            }

            // then step right one character at a time, keeping the best fit
            let mut best = (equality1.clone(), edit.clone(), equality2.clone());
            let mut best_score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                let c = edit.remove(0);
                equality1.push(c);
                edit.push(equality2.remove(0));
                let score = boundary_score(&equality1, &edit) + boundary_score(&edit, &equality2);
                if score >= best_score {
                    best_score = score;
                    best = (equality1.clone(), edit.clone(), equality2.clone());
                }
            }

            let (best1, best_edit, best2) = best;
            if script[pointer - 1].1 != best1 {
                if best1.is_empty() {
                    script.remove(pointer - 1);
                    pointer -= 1;
                } else {
                    script[pointer - 1].1 = best1;
                }
                script[pointer].1 = best_edit;
                if best2.is_empty() {
                    script.remove(pointer + 1);
                    pointer -= 1;
                } else {
                    script[pointer + 1].1 = best2;
                }
            }
        }
        pointer += 1;
    }
}

/// Scores the boundary between `one` and `two`; higher is a more natural
/// place to split.
fn boundary_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let whitespace1 = non_alnum1 && c1.is_whitespace();
    let whitespace2 = non_alnum2 && c2.is_whitespace();
    let line_break1 = whitespace1 && (c1 == '\n' || c1 == '\r');
    let line_break2 = whitespace2 && (c2 == '\n' || c2 == '\r');
    let blank_line1 = line_break1 && (one.ends_with(&['\n', '\n']) || one.ends_with(&['\n', '\r', '\n']));
    let blank_line2 = line_break2
        && (two.starts_with(&['\n', '\n'])
            || two.starts_with(&['\r', '\n', '\n'])
            || two.starts_with(&['\n', '\r', '\n'])
            || two.starts_with(&['\r', '\n', '\r', '\n']));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("", ""; "both empty")]
    #[test_case("", "abc"; "pure insertion")]
    #[test_case("abc", ""; "pure deletion")]
    #[test_case("The quick brown fox", "The quick red fox"; "word swap")]
    #[test_case("<p>Date the decision was made.</p>", "<p>Date the final decision was recorded.</p>"; "markup")]
    #[test_case("kitten sitting on the mat", "sitting kitten on a hat"; "reordered")]
    #[test_case("line one\n\nline two\n", "line one\n\nline 2\nline three\n"; "multi line")]
    #[test_case("héllo wörld", "hello world!"; "non ascii")]
    fn spans_rebuild_both_inputs(old: &str, new: &str) {
        let spans = diff(old, new);
        assert_eq!(old_text(&spans), old);
        assert_eq!(new_text(&spans), new);
    }

    const MIXED: &[char] = &['a', 'b', 'c', 'd', ' ', ' ', '\n', '.', 'é', 'ß', '字'];
    const LETTERS: &[char] = &[
        'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q',
        'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
    ];

    /// A small LCG so failures reproduce.
    fn next(state: &mut u64) -> usize {
        *state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (*state >> 33) as usize
    }

    fn random_text(state: &mut u64, alphabet: &[char], len: usize) -> String {
        (0..len)
            .map(|_| alphabet[next(state) % alphabet.len()])
            .collect()
    }

    /// `text` with one random range replaced by fresh random text.
    fn mutate(state: &mut u64, text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let start = next(state) % (chars.len() + 1);
        let end = start + next(state) % (chars.len() - start + 1);
        let len = next(state) % 8;
        let replacement = random_text(state, MIXED, len);
        chars[..start]
            .iter()
            .copied()
            .chain(replacement.chars())
            .chain(chars[end..].iter().copied())
            .collect()
    }

    #[test]
    fn random_pairs_rebuild_both_inputs() {
        let mut state = 0x5eed;
        for round in 0..3000 {
            let len = next(&mut state) % 48;
            let old = random_text(&mut state, MIXED, len);
            let new = if round % 2 == 0 {
                let len = next(&mut state) % 48;
                random_text(&mut state, MIXED, len)
            } else {
                mutate(&mut state, &old)
            };

            let spans = diff(&old, &new);

            assert_eq!(old_text(&spans), old, "old side of {old:?} -> {new:?}");
            assert_eq!(new_text(&spans), new, "new side of {old:?} -> {new:?}");
            assert_eq!(has_changed(&old, &new), old != new);
        }
    }

    #[test]
    fn large_unrelated_texts_finish_within_the_timeout() {
        let mut state = 42;
        let old = random_text(&mut state, LETTERS, 20_000);
        let new = random_text(&mut state, LETTERS, 20_000);
        let timeout = Duration::from_millis(200);

        let started = Instant::now();
        let spans = diff_with_timeout(&old, &new, timeout);
        let elapsed = started.elapsed();

        assert!(elapsed < timeout + Duration::from_secs(2), "took {elapsed:?}");
        assert_eq!(old_text(&spans), old);
        assert_eq!(new_text(&spans), new);
    }

    #[test]
    fn expired_timeout_falls_back_to_whole_replacement() {
        let spans = diff_with_timeout("alpha one beta", "gamma one delta", Duration::ZERO);

        assert_eq!(
            spans,
            vec![
                Span::delete("alpha one be"),
                Span::insert("gamma one del"),
                Span::equal("ta"),
            ]
        );
    }

    #[test]
    fn empty_inputs_yield_single_empty_equality() {
        assert_eq!(diff("", ""), vec![Span::equal("")]);
        assert!(!has_changed("", ""));
    }

    #[test]
    fn identical_inputs_are_unchanged() {
        assert_eq!(diff("same", "same"), vec![Span::equal("same")]);
        assert!(!has_changed("same", "same"));
    }

    #[test]
    fn word_replacement_is_one_edit_pair() {
        assert_eq!(
            diff("The quick brown fox", "The quick red fox"),
            vec![
                Span::equal("The quick "),
                Span::delete("brown"),
                Span::insert("red"),
                Span::equal(" fox"),
            ]
        );
    }

    #[test]
    fn trivial_equalities_are_folded_into_edits() {
        // a raw edit script keeps the shared 'o' and 's'
        assert_eq!(
            diff("mouse", "sofas"),
            vec![Span::delete("mouse"), Span::insert("sofas")]
        );
    }

    #[test]
    fn insertion_is_reported() {
        assert_eq!(
            diff("Date of decision", "Date of final decision"),
            vec![
                Span::equal("Date of "),
                Span::insert("final "),
                Span::equal("decision"),
            ]
        );
    }

    #[test]
    fn views_split_the_diff() {
        let spans = diff("The quick brown fox", "The quick red fox");

        let before: Vec<_> = deletion_view(&spans).map(|s| s.operation).collect();
        let after: Vec<_> = insertion_view(&spans).map(|s| s.operation).collect();

        assert_eq!(before, [Operation::Equal, Operation::Delete, Operation::Equal]);
        assert_eq!(after, [Operation::Equal, Operation::Insert, Operation::Equal]);
    }

    #[test]
    fn has_changed_detects_any_edit() {
        assert!(has_changed("a", "b"));
        assert!(has_changed("", "b"));
        assert!(has_changed("abc", "abcd"));
    }

    #[test]
    fn boundary_scores_prefer_blank_lines() {
        let one: Vec<char> = "end.\n\n".chars().collect();
        let two: Vec<char> = "Next".chars().collect();
        assert_eq!(boundary_score(&one, &two), 5);

        let word: Vec<char> = "ab".chars().collect();
        assert_eq!(boundary_score(&word, &word), 0);
        assert_eq!(boundary_score(&[], &word), 6);
    }
}
