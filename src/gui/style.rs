use iced::{Background, Border, Color, Shadow, Theme};
use iced::widget::{button, container};

pub struct TextButtonStyleSheet;

impl button::StyleSheet for TextButtonStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            shadow_offset: Default::default(),
            background: None,
            text_color: Color::BLACK,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

// the box the cs/vrc activity feeds scroll inside
pub struct LogContainerStyleSheet;

impl container::StyleSheet for LogContainerStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(Color::from_rgb(0.95, 0.95, 0.95))),
            border: Border {
                color: Color::from_rgb(0.75, 0.75, 0.75),
                width: 1.0,
                radius: 2.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}
