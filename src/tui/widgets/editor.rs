use ratatui::layout::Rect;

/// Text input used by the task form and the filter modal. Cursor columns
/// count characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    /// First visible line
    pub scroll_offset: usize,
    /// First visible column
    pub scroll_col: usize,
    undo_stack: Vec<(Vec<String>, usize, usize)>,
    max_history: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            scroll_col: 0,
            undo_stack: Vec::new(),
            max_history: 100,
        }
    }

    /// Editor holding `content` with the cursor at the end
    pub fn from_string(content: &str) -> Self {
        let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let cursor_line = lines.len() - 1;
        let cursor_col = lines[cursor_line].chars().count();
        Self {
            lines,
            cursor_line,
            cursor_col,
            ..Self::new()
        }
    }

    /// Trimmed content, `None` when blank
    pub fn value(&self) -> Option<String> {
        let text = self.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
    }

    fn current_len(&self) -> usize {
        self.lines[self.cursor_line].chars().count()
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices().nth(col).map(|(i, _)| i).unwrap_or(line.len())
    }

    fn snapshot(&mut self) {
        if self.undo_stack.len() == self.max_history {
            self.undo_stack.remove(0);
        }
        self.undo_stack
            .push((self.lines.clone(), self.cursor_line, self.cursor_col));
    }

    pub fn insert_char(&mut self, ch: char) {
        self.snapshot();
        let line = &mut self.lines[self.cursor_line];
        let at = Self::byte_index(line, self.cursor_col);
        line.insert(at, ch);
        self.cursor_col += 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.cursor_col > 0 {
            self.snapshot();
            let line = &mut self.lines[self.cursor_line];
            let at = Self::byte_index(line, self.cursor_col - 1);
            line.remove(at);
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.snapshot();
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.current_len();
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.cursor_col < self.current_len() {
            self.snapshot();
            let line = &mut self.lines[self.cursor_line];
            let at = Self::byte_index(line, self.cursor_col);
            line.remove(at);
        } else if self.cursor_line + 1 < self.lines.len() {
            self.snapshot();
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    pub fn insert_newline(&mut self) {
        self.snapshot();
        let line = &mut self.lines[self.cursor_line];
        let at = Self::byte_index(line, self.cursor_col);
        let rest = line.split_off(at);
        self.cursor_line += 1;
        self.lines.insert(self.cursor_line, rest);
        self.cursor_col = 0;
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some((lines, line, col)) => {
                self.lines = lines;
                self.cursor_line = line;
                self.cursor_col = col;
                true
            }
            None => false,
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.current_len();
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.current_len() {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.cursor_col.min(self.current_len());
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = self.cursor_col.min(self.current_len());
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.current_len();
    }

    pub fn move_cursor_word_left(&mut self) {
        let chars: Vec<char> = self.lines[self.cursor_line].chars().collect();
        let mut col = self.cursor_col;
        while col > 0 && chars[col - 1].is_whitespace() {
            col -= 1;
        }
        while col > 0 && !chars[col - 1].is_whitespace() {
            col -= 1;
        }
        self.cursor_col = col;
    }

    pub fn move_cursor_word_right(&mut self) {
        let chars: Vec<char> = self.lines[self.cursor_line].chars().collect();
        let mut col = self.cursor_col;
        while col < chars.len() && !chars[col].is_whitespace() {
            col += 1;
        }
        while col < chars.len() && chars[col].is_whitespace() {
            col += 1;
        }
        self.cursor_col = col;
    }

    /// Keep the cursor inside a viewport of the given size
    pub fn update_scroll(&mut self, viewport_height: usize, viewport_width: usize) {
        let height = viewport_height.max(1);
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if self.cursor_line >= self.scroll_offset + height {
            self.scroll_offset = self.cursor_line + 1 - height;
        }

        let width = viewport_width.max(1);
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + width {
            self.scroll_col = self.cursor_col + 1 - width;
        }
    }

    /// Lines visible in the viewport, horizontally scrolled
    pub fn visible_lines(&self, viewport_height: usize, viewport_width: usize) -> Vec<String> {
        self.lines
            .iter()
            .skip(self.scroll_offset)
            .take(viewport_height.max(1))
            .map(|line| line.chars().skip(self.scroll_col).take(viewport_width).collect())
            .collect()
    }

    /// Terminal position of the cursor inside `area`
    pub fn cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let row = self.cursor_line.checked_sub(self.scroll_offset)?;
        let col = self.cursor_col.checked_sub(self.scroll_col)?;
        if row >= area.height as usize || col >= area.width as usize {
            return None;
        }
        Some((area.x + col as u16, area.y + row as u16))
    }
}

impl std::fmt::Display for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_by_character() {
        let mut editor = Editor::from_string("学习 plan");
        editor.move_cursor_home();
        editor.move_cursor_right();
        editor.delete_char();
        assert_eq!(editor.to_string(), "习 plan");
        editor.insert_char('复');
        assert_eq!(editor.to_string(), "复习 plan");
    }

    #[test]
    fn newline_and_backspace_join_lines() {
        let mut editor = Editor::from_string("ab");
        editor.move_cursor_left();
        editor.insert_newline();
        assert_eq!(editor.lines, vec!["a", "b"]);
        editor.delete_char();
        assert_eq!(editor.to_string(), "ab");
        assert_eq!((editor.cursor_line, editor.cursor_col), (0, 1));
    }

    #[test]
    fn undo_restores_previous_text() {
        let mut editor = Editor::new();
        editor.insert_char('a');
        editor.insert_char('b');
        assert!(editor.undo());
        assert_eq!(editor.to_string(), "a");
        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(editor.value(), None);
    }

    #[test]
    fn word_motion_skips_whitespace() {
        let mut editor = Editor::from_string("buy  oat milk");
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor_col, 9);
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor_col, 5);
        editor.move_cursor_home();
        editor.move_cursor_word_right();
        assert_eq!(editor.cursor_col, 5);
    }

    #[test]
    fn value_trims_and_scroll_follows_cursor() {
        assert_eq!(Editor::from_string("  x ").value().as_deref(), Some("x"));
        assert_eq!(Editor::from_string("   ").value(), None);

        let mut editor = Editor::from_string("0123456789");
        editor.update_scroll(1, 4);
        assert_eq!(editor.scroll_col, 7);
        assert_eq!(editor.visible_lines(1, 4), vec!["789"]);
        assert_eq!(editor.cursor_screen_pos(Rect::new(10, 5, 4, 1)), Some((13, 5)));
    }
}
