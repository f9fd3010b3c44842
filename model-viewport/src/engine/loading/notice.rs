use bevy::prelude::*;
use constants::notice::{
    DEFAULT_LOAD_FAILURE_MESSAGE, NOTICE_BACKGROUND_COLOUR, NOTICE_BORDER_RADIUS,
    NOTICE_FONT_SIZE, NOTICE_OFFSET, NOTICE_PADDING, NOTICE_TEXT_COLOUR,
};

use crate::engine::core::app_state::ViewportEntity;
use crate::engine::scene::grid::hex_colour;

/// Red badge over the top-left of the viewport describing a failed load.
#[derive(Component, Debug, Clone)]
pub struct LoadErrorNotice {
    pub message: String,
}

/// Text to show for a failure, falling back to a generic message when empty.
pub fn notice_message(message: &str) -> &str {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        DEFAULT_LOAD_FAILURE_MESSAGE
    } else {
        trimmed
    }
}

pub fn spawn_load_error_notice(commands: &mut Commands, message: &str) -> Entity {
    let message = notice_message(message).to_string();

    commands
        .spawn((
            Name::new("Load Error Notice"),
            Node {
                position_type: PositionType::Absolute,
                top: Val::Px(NOTICE_OFFSET),
                left: Val::Px(NOTICE_OFFSET),
                padding: UiRect::all(Val::Px(NOTICE_PADDING)),
                ..default()
            },
            BackgroundColor(hex_colour(NOTICE_BACKGROUND_COLOUR)),
            BorderRadius::all(Val::Px(NOTICE_BORDER_RADIUS)),
            LoadErrorNotice {
                message: message.clone(),
            },
            ViewportEntity,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(message),
                TextFont {
                    font_size: NOTICE_FONT_SIZE,
                    ..default()
                },
                TextColor(hex_colour(NOTICE_TEXT_COLOUR)),
            ));
        })
        .id()
}

/// Removes every notice left by earlier load attempts.
pub fn clear_load_error_notices(
    commands: &mut Commands,
    notices: &Query<Entity, With<LoadErrorNotice>>,
) {
    for notice in notices.iter() {
        commands.entity(notice).despawn();
    }
}
