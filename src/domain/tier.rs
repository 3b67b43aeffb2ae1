use serde::Serialize;

const BADGE: &str = "https://taller-de-programacion-2.github.io/works/statement/2021/2/tp/ubademy.png";

/// Id of the free tier every user falls back to
pub const DEFAULT_TIER_ID: i32 = 0;
/// Id of the tier from which `discount_plus` applies to courses
pub const PLUS_TIER_ID: i32 = 1;

/// A subscription tier from the static catalog
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tier {
    pub id: i32,
    pub name: &'static str,
    pub description: &'static str,
    pub price: f64,
    /// Percentage off courses classified under the default tier
    pub discount_default: u8,
    /// Percentage off courses classified under the plus tier
    pub discount_plus: u8,
    pub badge: &'static str,
}

pub const TIERS: [Tier; 3] = [
    Tier {
        id: DEFAULT_TIER_ID,
        name: "Default",
        description: "Default subscription. You cannot enroll in courses+",
        price: 0.0,
        discount_default: 0,
        discount_plus: 0,
        badge: BADGE,
    },
    Tier {
        id: PLUS_TIER_ID,
        name: "Ubademy+",
        description: "Join any course you want with Ubademy+ and enjoy the discounts!",
        price: 16.99,
        discount_default: 25,
        discount_plus: 10,
        badge: BADGE,
    },
    Tier {
        id: 2,
        name: "Ubademy Pass",
        description: "Immerse yourself in a library of hundreds of high-quality courses. Enjoy the discounts on all courses when you join Ubademy Pass.",
        price: 34.99,
        discount_default: 50,
        discount_plus: 25,
        badge: BADGE,
    },
];

impl Tier {
    /// Look a tier up in the catalog
    pub fn by_id(id: i32) -> Option<&'static Tier> {
        TIERS.iter().find(|tier| tier.id == id)
    }

    pub fn is_paid(&self) -> bool {
        self.id != DEFAULT_TIER_ID
    }

    /// Whether a subscriber on this tier may enroll in a course of `course_tier`.
    /// Only the default tier is restricted, and only from paid-tier courses.
    pub fn permits(&self, course_tier: i32) -> bool {
        course_tier < PLUS_TIER_ID || self.is_paid()
    }

    /// Price a subscriber on this tier pays for a course of `course_tier`
    pub fn apply_discount(&self, price: f64, course_tier: i32) -> f64 {
        let percentage = match course_tier {
            DEFAULT_TIER_ID => self.discount_default,
            PLUS_TIER_ID => self.discount_plus,
            _ => 0,
        };
        price * (1.0 - f64::from(percentage) / 100.0)
    }
}
