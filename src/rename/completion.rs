//! Line editing state for the rename prompt. Nothing here touches the
//! terminal, so every key sequence can be replayed in tests.

const SEPARATORS: [char; 3] = ['-', '.', '_'];
const HD_MARKER: &str = "1080";
const HD_SUFFIX: &str = "-HD";

/// Removes the first run of three two-digit parts (`yy.mm.dd`) and returns
/// them joined, e.g. `["Show", "20", "03", "14", "1080p"]` gives `"200314"`.
pub fn strip_date_candidate(parts: &mut Vec<String>) -> Option<String> {
    let is_two_digits = |part: &String| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());

    let mut run = 0;
    for i in 0..parts.len() {
        if !is_two_digits(&parts[i]) {
            run = 0;
            continue;
        }
        run += 1;
        if run == 3 {
            let date: String = parts.drain(i - 2..=i).collect();
            return Some(date);
        }
    }
    None
}

/// Completion candidates taken from a release folder name. The date, when
/// there is one, is offered first.
#[derive(Debug, Clone, Default)]
pub struct Completer {
    parts: Vec<String>,
}

impl Completer {
    pub fn from_folder_name(name: &str) -> Self {
        let mut parts: Vec<String> = name.split('.').map(str::to_string).collect();
        if let Some(date) = strip_date_candidate(&mut parts) {
            parts.insert(0, date);
        }
        Self { parts }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// First part starting with `input`, ignoring case. Falls back to the
    /// input itself.
    pub fn complete(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();
        self.parts
            .iter()
            .find(|part| part.to_lowercase().starts_with(&input_lower))
            .cloned()
            .unwrap_or_else(|| input.to_string())
    }

    fn is_hd(&self) -> bool {
        self.parts.iter().any(|part| part.contains(HD_MARKER))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Tab or space.
    Accept,
    Backspace,
    Enter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputState {
    pub accepted: String,
    pub current: String,
    pub suggestion: String,
}

impl InputState {
    /// Applies one key. Returns true once the name is complete.
    pub fn handle(&mut self, key: Key, completer: &Completer) -> bool {
        match key {
            Key::Enter => {
                self.accepted.push_str(&self.current);
                self.current.clear();
                self.suggestion.clear();
                self.add_hd_suffix(completer);
                return true;
            }
            Key::Accept => self.accept_suggestion(),
            Key::Backspace => self.delete_char(),
            Key::Char(c) if SEPARATORS.contains(&c) => {
                if !self.suggestion.is_empty() {
                    self.accept_suggestion();
                }
                self.accepted.push(c);
            }
            Key::Char(c) => {
                self.current.push(c);
                self.suggestion = completer.complete(&self.current);
            }
        }
        false
    }

    fn accept_suggestion(&mut self) {
        self.accepted.push_str(&self.suggestion);
        self.current.clear();
        self.suggestion.clear();
    }

    fn delete_char(&mut self) {
        if self.current.pop().is_some() {
            self.suggestion = self.current.clone();
        } else {
            self.accepted.pop();
        }
    }

    fn add_hd_suffix(&mut self, completer: &Completer) {
        if completer.is_hd() && !self.accepted.ends_with(HD_SUFFIX) {
            self.accepted.push_str(HD_SUFFIX);
        }
    }

    /// `[typed => suggestion]`
    pub fn proposal(&self) -> String {
        format!("[{} => {}]", self.current, self.suggestion)
    }

    /// The name as it would be if the suggestion were taken.
    pub fn preview(&self) -> String {
        format!("{}{}", self.accepted, self.suggestion)
    }

    /// Columns the cursor sits left of the end of [`Self::preview`].
    pub fn cursor_offset(&self) -> usize {
        self.suggestion
            .chars()
            .count()
            .saturating_sub(self.current.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(name: &str) -> Vec<String> {
        name.split('.').map(str::to_string).collect()
    }

    fn type_keys(state: &mut InputState, completer: &Completer, keys: &str) {
        for c in keys.chars() {
            let key = match c {
                '\t' | ' ' => Key::Accept,
                '\x7f' => Key::Backspace,
                c => Key::Char(c),
            };
            state.handle(key, completer);
        }
    }

    #[test]
    fn test_strip_date_candidate() {
        let mut name = parts("Some.Show.20.03.14.Guest.1080p");

        assert_eq!(strip_date_candidate(&mut name).as_deref(), Some("200314"));
        assert_eq!(name, ["Some", "Show", "Guest", "1080p"]);
    }

    #[test]
    fn test_strip_date_candidate_needs_three_in_a_row() {
        let mut name = parts("Show.20.03.x.14.720p");

        assert_eq!(strip_date_candidate(&mut name), None);
        assert_eq!(name.len(), 6);
    }

    #[test]
    fn test_completer_offers_date_first() {
        let completer = Completer::from_folder_name("Some.Show.20.03.14.Guest.1080p");

        assert_eq!(completer.parts()[0], "200314");
        assert_eq!(completer.complete("gu"), "Guest");
        assert_eq!(completer.complete("2"), "200314");
        assert_eq!(completer.complete("zz"), "zz");
    }

    #[test]
    fn test_separator_accepts_suggestion() {
        let completer = Completer::from_folder_name("Some.Show.20.03.14.Guest.720p");
        let mut state = InputState::default();

        type_keys(&mut state, &completer, "so-gu");
        assert_eq!(state.proposal(), "[gu => Guest]");
        assert_eq!(state.preview(), "Some-Guest");
        assert_eq!(state.cursor_offset(), 3);

        assert!(state.handle(Key::Enter, &completer));
        assert_eq!(state.accepted, "Some-gu");
    }

    #[test]
    fn test_tab_then_enter_keeps_completion() {
        let completer = Completer::from_folder_name("Some.Show.20.03.14.Guest.720p");
        let mut state = InputState::default();

        type_keys(&mut state, &completer, "2\t_sh\t");
        state.handle(Key::Enter, &completer);

        assert_eq!(state.accepted, "200314_Show");
    }

    #[test]
    fn test_backspace_edits_current_then_accepted() {
        let completer = Completer::from_folder_name("Show.Guest");
        let mut state = InputState::default();

        type_keys(&mut state, &completer, "sh\t-gu\x7f");
        assert_eq!(state.current, "g");
        assert_eq!(state.suggestion, "g");

        type_keys(&mut state, &completer, "\x7f\x7f");
        assert_eq!(state.accepted, "Show");
    }

    #[test]
    fn test_hd_suffix_added_once_for_1080_sources() {
        let completer = Completer::from_folder_name("Show.1080p");
        let mut state = InputState::default();

        type_keys(&mut state, &completer, "sh\t");
        state.handle(Key::Enter, &completer);
        assert_eq!(state.accepted, "Show-HD");

        let mut typed = InputState::default();
        type_keys(&mut typed, &completer, "x-HD");
        typed.handle(Key::Enter, &completer);
        assert_eq!(typed.accepted, "x-HD");
    }

    #[test]
    fn test_no_hd_suffix_for_other_sources() {
        let completer = Completer::from_folder_name("Show.720p");
        let mut state = InputState::default();

        type_keys(&mut state, &completer, "abc");
        state.handle(Key::Enter, &completer);

        assert_eq!(state.accepted, "abc");
    }
}
