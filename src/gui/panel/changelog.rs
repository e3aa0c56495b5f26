use iced::{Element, Font, Length};
use iced::theme;
use iced::widget::{container, scrollable, text};

use crate::gui::style::LogContainerStyleSheet;
use crate::resources::CHANGELOG;

/// Collapsible release notes at the bottom of the window. The text itself
/// is compiled in, see [crate::resources].
pub struct ChangelogPanel {
    visible: bool,
}

impl ChangelogPanel {
    pub fn new() -> ChangelogPanel {
        ChangelogPanel {
            visible: false,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn view<Message: 'static>(&self) -> Element<Message> {
        container(
            scrollable(
                text(CHANGELOG).size(13).font(Font::MONOSPACE)
            ).height(160)
        )
            .style(theme::Container::Custom(Box::new(LogContainerStyleSheet)))
            .width(Length::Fill)
            .padding(8)
            .into()
    }
}

impl Default for ChangelogPanel {
    fn default() -> Self {
        ChangelogPanel::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_hidden_and_toggles() {
        let mut panel = ChangelogPanel::new();
        assert!(!panel.visible());

        panel.toggle();
        assert!(panel.visible());

        panel.toggle();
        assert!(!panel.visible());
    }
}
