//! Hover bob - a linear up/down bounce on the model's Y position

use bevy::prelude::*;

/// Plugin for the hover bob
pub struct HoverPlugin;

impl Plugin for HoverPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, hover_models);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoverDirection {
    #[default]
    Ascending,
    Descending,
}

impl HoverDirection {
    pub fn sign(self) -> f32 {
        match self {
            Self::Ascending => 1.0,
            Self::Descending => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Per-model bob state; the offset stays within `[-height, height]`
#[derive(Component, Debug, Clone)]
pub struct HoverBob {
    offset: f32,
    direction: HoverDirection,
    speed: f32,
    height: f32,
    /// Y position the bob is centred on
    base_y: f32,
}

impl HoverBob {
    /// A negative height is taken by magnitude; NaN collapses the bob to zero
    pub fn new(speed: f32, height: f32, base_y: f32) -> Self {
        let height = if height.is_nan() { 0.0 } else { height.abs() };
        Self {
            offset: 0.0,
            direction: HoverDirection::Ascending,
            speed,
            height,
            base_y,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn direction(&self) -> HoverDirection {
        self.direction
    }

    /// Advance one frame and return the new offset
    ///
    /// Reaching either bound flips the direction for the following ticks.
    pub fn tick(&mut self) -> f32 {
        self.offset += self.direction.sign() * self.speed;
        if self.offset >= self.height || self.offset <= -self.height {
            self.direction = self.direction.flipped();
            self.offset = self.offset.max(-self.height).min(self.height);
        }
        self.offset
    }

    /// Y coordinate for the current offset
    pub fn y(&self) -> f32 {
        self.base_y + self.offset
    }
}

/// Advance every bobbing model by one frame
pub fn hover_models(mut models: Query<(&mut HoverBob, &mut Transform)>) {
    for (mut bob, mut transform) in models.iter_mut() {
        bob.tick();
        transform.translation.y = bob.y();
    }
}
