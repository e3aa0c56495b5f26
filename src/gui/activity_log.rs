use std::collections::VecDeque;
use iced::{Element, Font, Length};
use iced::theme;
use iced::widget::{container, scrollable, Column, text};

use crate::gui::style::LogContainerStyleSheet;

/**
 * The scrolling activity feed behind the cs and vrc panels.
 *
 * Eviction happens after the append and removes at most one entry per
 * append: the 51st append removes exactly the oldest entry and every
 * append after that keeps the length at [ActivityLog::CAP].
 */
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<String>,
}

impl ActivityLog {
    pub const CAP: usize = 50;

    pub fn new() -> ActivityLog {
        ActivityLog {
            entries: VecDeque::with_capacity(ActivityLog::CAP + 1),
        }
    }

    pub fn append(&mut self, entry: impl Into<String>) {
        self.entries.push_back(entry.into());
        if self.entries.len() > ActivityLog::CAP {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        ActivityLog::new()
    }
}

/**
 * The scrollable widget for an [ActivityLog]. The caller keeps the
 * [scrollable::Id] so it can snap the feed to the newest entry whenever it
 * appends one.
 */
pub fn log_view<'a, Message: 'a>(log: &'a ActivityLog, id: scrollable::Id) -> Element<'a, Message> {
    container(
        scrollable(
            Column::with_children(
                log.iter()
                    .map(|entry| text(format!("-> {}", entry)).size(13).font(Font::MONOSPACE))
                    .map(Element::from)
            )
                .spacing(2)
                .width(Length::Fill)
        )
            .id(id)
            .height(200)
    )
    .style(theme::Container::Custom(Box::new(LogContainerStyleSheet)))
    .width(Length::Fill)
    .padding(8)
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_everything_below_the_cap() {
        let mut log = ActivityLog::new();
        for n in 0..ActivityLog::CAP {
            log.append(format!("entry {}", n));
        }

        assert_eq!(log.len(), ActivityLog::CAP);
        assert_eq!(log.iter().next(), Some("entry 0"));
        assert_eq!(log.iter().last(), Some("entry 49"));
    }

    #[test]
    fn the_51st_append_evicts_exactly_the_oldest() {
        let mut log = ActivityLog::new();
        for n in 0..=ActivityLog::CAP {
            log.append(format!("entry {}", n));
        }

        assert_eq!(log.len(), ActivityLog::CAP);
        assert_eq!(log.iter().next(), Some("entry 1"));
        assert_eq!(log.iter().last(), Some("entry 50"));
    }

    #[test]
    fn evicts_one_entry_per_append_once_full() {
        let mut log = ActivityLog::new();
        for n in 0..200 {
            log.append(format!("entry {}", n));

            if n >= ActivityLog::CAP {
                assert_eq!(log.len(), ActivityLog::CAP);
                // the window advanced by exactly one
                assert_eq!(log.iter().next(), Some(format!("entry {}", n - ActivityLog::CAP + 1).as_str()));
            }
        }
    }
}
