use serde::{Deserialize, Serialize};

/// Physical device orientation reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Portrait,
        Orientation::PortraitUpsideDown,
        Orientation::LandscapeLeft,
        Orientation::LandscapeRight,
    ];
}

/// Rotations a screen accepts. Declared once per screen and never changed.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum OrientationSupport {
    /// Upright only.
    #[default]
    Portrait,
    LandscapeRight,
    LandscapeLeft,
    /// Both landscape orientations, no portrait.
    Landscape,
    All,
}

impl OrientationSupport {
    /// Maps the host's integer code (0 = portrait ... 4 = all).
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Portrait),
            1 => Some(Self::LandscapeRight),
            2 => Some(Self::LandscapeLeft),
            3 => Some(Self::Landscape),
            4 => Some(Self::All),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Portrait => 0,
            Self::LandscapeRight => 1,
            Self::LandscapeLeft => 2,
            Self::Landscape => 3,
            Self::All => 4,
        }
    }

    pub fn permits(self, orientation: Orientation) -> bool {
        use Orientation::*;
        match self {
            Self::Portrait => orientation == Portrait,
            Self::LandscapeRight => orientation == LandscapeRight,
            Self::LandscapeLeft => orientation == LandscapeLeft,
            Self::Landscape => {
                matches!(orientation, LandscapeLeft | LandscapeRight)
            }
            Self::All => true,
        }
    }

    /// Every orientation this value permits, in `Orientation::ALL` order.
    pub fn allowed(self) -> Vec<Orientation> {
        Orientation::ALL
            .into_iter()
            .filter(|orientation| self.permits(*orientation))
            .collect()
    }

    /// Orientation to present in when the screen first appears.
    pub fn preferred(self) -> Orientation {
        match self {
            Self::Portrait | Self::All => Orientation::Portrait,
            Self::LandscapeLeft => Orientation::LandscapeLeft,
            Self::LandscapeRight | Self::Landscape => {
                Orientation::LandscapeRight
            }
        }
    }
}
