//! Danger ratings, danger modes and the danger-rating icon

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::domain::cache::CacheKey;
use crate::domain::DomainError;

const OFF_SEASON_ICON: &str = include_str!("../../../assets/icons/off_season.svg");
const EARLY_SEASON_ICON: &str = include_str!("../../../assets/icons/early_season.svg");
const SPRING_SITUATION_ICON: &str = include_str!("../../../assets/icons/spring_situation.svg");

/// Danger rating of one elevation band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerRating {
    Level(u8),
    NoRating,
}

impl DangerRating {
    /// Parses a rating code: `0`..`5` or `n`
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "n" | "N" => Some(DangerRating::NoRating),
            level => level
                .parse::<u8>()
                .ok()
                .filter(|l| *l <= 5)
                .map(DangerRating::Level),
        }
    }

    /// Parses a rating as found in forecasts, e.g. `"3:Considerable"` or `"N/A:No Rating"`
    ///
    /// Anything without a leading level is treated as no rating.
    pub fn from_forecast(value: &str) -> Self {
        let code = value.split(':').next().unwrap_or_default();
        match Self::from_code(code) {
            Some(rating) => rating,
            None => DangerRating::NoRating,
        }
    }

    pub fn code(&self) -> String {
        match self {
            DangerRating::Level(level) => level.to_string(),
            DangerRating::NoRating => "n".to_string(),
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DangerRating::Level(1) => "#52BA4A",
            DangerRating::Level(2) => "#FFF300",
            DangerRating::Level(3) => "#F79218",
            DangerRating::Level(4) => "#EF1C29",
            DangerRating::Level(5) => "#1D1D1B",
            DangerRating::Level(_) | DangerRating::NoRating => "#FFFFFF",
        }
    }
}

/// Ratings for the three elevation bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconRatings {
    pub alp: DangerRating,
    pub tln: DangerRating,
    pub btl: DangerRating,
}

impl IconRatings {
    pub fn unrated() -> Self {
        Self {
            alp: DangerRating::NoRating,
            tln: DangerRating::NoRating,
            btl: DangerRating::NoRating,
        }
    }

    /// Parses explicit band codes; an unknown code is a render error
    pub fn parse(alp: &str, tln: &str, btl: &str) -> Result<Self, DomainError> {
        let band = |name: &str, code: &str| {
            DangerRating::from_code(code).ok_or_else(|| {
                DomainError::render(format!("Unknown {} danger rating '{}'", name, code))
            })
        };

        Ok(Self {
            alp: band("alpine", alp)?,
            tln: band("treeline", tln)?,
            btl: band("below treeline", btl)?,
        })
    }

    /// Ratings of the first (current) day of a forecast
    pub fn from_forecast(forecast: &Value) -> Result<Self, DomainError> {
        let ratings = forecast
            .pointer("/dangerRatings/0/dangerRating")
            .ok_or_else(|| DomainError::parse("Forecast has no current danger ratings"))?;

        let band = |name: &str| {
            ratings
                .get(name)
                .and_then(Value::as_str)
                .map(DangerRating::from_forecast)
                .unwrap_or(DangerRating::NoRating)
        };

        Ok(Self {
            alp: band("alp"),
            tln: band("tln"),
            btl: band("btl"),
        })
    }

    pub fn cache_key(&self) -> CacheKey {
        icon_key(&self.alp.code(), &self.tln.code(), &self.btl.code())
    }

    pub fn render(&self) -> String {
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="48" viewBox="0 0 48 48">
  <g stroke="#1D1D1B" stroke-width="1">
    <polygon points="24,2 33,16 15,16" fill="{}"/>
    <polygon points="15,16 33,16 42,31 6,31" fill="{}"/>
    <polygon points="6,31 42,31 47,46 1,46" fill="{}"/>
  </g>
</svg>
"##,
            self.alp.color(),
            self.tln.color(),
            self.btl.color()
        )
    }
}

/// Fragment key of a danger icon
fn icon_key(alp: &str, tln: &str, btl: &str) -> CacheKey {
    CacheKey::builder("fragment")
        .segment("danger-icon")
        .param("alp", alp)
        .param("tln", tln)
        .param("btl", btl)
        .build()
}

/// Seasonal mode a forecast is published in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerMode {
    Regular,
    Off,
    Early,
    Spring,
}

impl DangerMode {
    pub fn of_forecast(forecast: &Value) -> Result<Self, DomainError> {
        forecast
            .get("dangerMode")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::parse("Forecast has no danger mode"))?
            .parse()
    }

    /// Fixed icon for seasonal modes; regular season icons are rendered
    pub fn seasonal_icon(&self) -> Option<&'static str> {
        match self {
            DangerMode::Regular => None,
            DangerMode::Off => Some(OFF_SEASON_ICON),
            DangerMode::Early => Some(EARLY_SEASON_ICON),
            DangerMode::Spring => Some(SPRING_SITUATION_ICON),
        }
    }
}

impl FromStr for DangerMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Regular season" => Ok(DangerMode::Regular),
            "Off season" => Ok(DangerMode::Off),
            "Early season" => Ok(DangerMode::Early),
            "Spring situation" => Ok(DangerMode::Spring),
            other => Err(DomainError::parse(format!("Unknown danger mode '{}'", other))),
        }
    }
}

impl fmt::Display for DangerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DangerMode::Regular => "Regular season",
            DangerMode::Off => "Off season",
            DangerMode::Early => "Early season",
            DangerMode::Spring => "Spring situation",
        };
        write!(f, "{}", s)
    }
}
