use iced::Alignment;
use iced::widget::{row, text, text_input};
use iced::Element;

use crate::bridge::protocol::Strength;

/**
 * Edit state of one strength field.
 *
 * The text buffer follows every keystroke but the committed strength only
 * changes when the field is submitted. A commit that is out of range or not
 * a number resets both the buffer and the committed value to
 * [Strength::DEFAULT]; an in-range commit leaves the buffer exactly as the
 * user typed it.
 */
#[derive(Debug, Clone)]
pub struct StrengthInput {
    buffer: String,
    committed: Strength,
}

impl StrengthInput {
    pub fn new() -> StrengthInput {
        StrengthInput {
            buffer: Strength::DEFAULT.to_string(),
            committed: Strength::DEFAULT,
        }
    }

    pub fn committed(&self) -> Strength {
        self.committed
    }

    pub fn edit(&mut self, value: String) {
        self.buffer = value;
    }

    pub fn commit(&mut self) -> Strength {
        self.committed = match Strength::parse(&self.buffer) {
            Some(strength) => strength,
            None => {
                self.buffer = Strength::DEFAULT.to_string();
                Strength::DEFAULT
            },
        };

        self.committed
    }

    /// A field without its handlers renders greyed out, which is how the
    /// panels lock strength edits while the backend is not connected.
    pub fn view<'a, Message: Clone + 'a>(
        &self,
        label: &'a str,
        enabled: bool,
        on_edit: impl Fn(String) -> Message + 'a,
        on_commit: Message,
    ) -> Element<'a, Message> {
        let mut input = text_input("", self.buffer.as_str()).width(50);
        if enabled {
            input = input.on_input(on_edit).on_submit(on_commit);
        }

        row![text(label), input]
            .align_items(Alignment::Center)
            .spacing(10)
            .into()
    }
}

impl Default for StrengthInput {
    fn default() -> Self {
        StrengthInput::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_the_default() {
        let input = StrengthInput::new();
        assert_eq!(input.committed(), Strength::DEFAULT);
    }

    #[test]
    fn in_range_commit_keeps_the_typed_text() {
        let mut input = StrengthInput::new();

        input.edit("040".to_string());
        assert_eq!(input.commit().get(), 40);
        assert_eq!(input.buffer, "040");
    }

    #[test]
    fn out_of_range_commit_resets_to_default() {
        let mut input = StrengthInput::new();

        input.edit("150".to_string());
        assert_eq!(input.commit(), Strength::DEFAULT);
        assert_eq!(input.buffer, "24");

        input.edit("abc".to_string());
        assert_eq!(input.commit(), Strength::DEFAULT);
        assert_eq!(input.buffer, "24");
    }

    #[test]
    fn editing_does_not_move_the_committed_value() {
        let mut input = StrengthInput::new();

        input.edit("77".to_string());
        assert_eq!(input.committed(), Strength::DEFAULT);

        input.commit();
        assert_eq!(input.committed().get(), 77);
    }
}
