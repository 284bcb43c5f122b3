pub const CYCLE_DAYS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn from_index(index: usize) -> Self {
        match index % 7 {
            0 => Self::Mon,
            1 => Self::Tue,
            2 => Self::Wed,
            3 => Self::Thu,
            4 => Self::Fri,
            5 => Self::Sat,
            _ => Self::Sun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }
}

pub fn is_weekday(day_index: usize) -> bool {
    let position = (day_index + 1) % 7;
    position > 0 && position < 6
}

pub fn calc_weight(data_age_in_days: usize) -> f64 {
    if data_age_in_days < 28 {
        1.0
    } else if data_age_in_days < 42 {
        0.8
    } else if data_age_in_days < 56 {
        0.6
    } else if data_age_in_days < 70 {
        0.4
    } else if data_age_in_days < 120 {
        0.15
    } else {
        0.0
    }
}

pub fn cycle_position(day_index: usize) -> usize {
    day_index % CYCLE_DAYS
}
