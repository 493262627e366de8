//! Users, their training profile and body-weight history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::exercise::LevelPreparation;
use super::ids::{UserId, UserParamsId, WeightId};

string_enum! {
    /// Training goal.
    pub enum Want as "user params want" {
        LoseWeight => "lose_weight",
        BuildMuscle => "build_muscle",
        StayFit => "stay_fit",
    }
}

string_enum! {
    /// Everyday activity. The only input to exercise-level filtering.
    pub enum Lifestyle as "user params lifestyle" {
        NotActive => "not_active",
        Active => "active",
        Sportive => "sportive",
    }
}

impl Lifestyle {
    pub fn to_level_preparation(self) -> LevelPreparation {
        match self {
            Lifestyle::NotActive => LevelPreparation::Beginner,
            Lifestyle::Active => LevelPreparation::Medium,
            Lifestyle::Sportive => LevelPreparation::Sportsman,
        }
    }

    /// Multiplier applied to an exercise's base repetition count.
    pub fn rep_coefficient(self) -> f64 {
        match self {
            Lifestyle::NotActive => 0.8,
            Lifestyle::Active => 1.0,
            Lifestyle::Sportive => 1.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub username: String,
    pub name: String,
    pub surname: String,
    /// Opaque hash produced by the auth layer.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfoUpdate {
    pub username: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UserInfo {
    pub fn apply(&mut self, update: UserInfoUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(surname) = update.surname {
            self.surname = surname;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
    }
}

/// Per-user profile driving workout generation. One per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserParams {
    pub id: UserParamsId,
    pub user_id: UserId,
    pub height: u32,
    pub photo: String,
    pub want: Want,
    pub lifestyle: Lifestyle,
    pub target_weight: f64,
    pub target_workouts_weeks: u32,
    pub target_calories_daily: u32,
    /// Filled from the latest weight entry on read; `None` without history.
    #[serde(default)]
    pub current_weight: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserParamsUpdate {
    pub height: Option<u32>,
    pub photo: Option<String>,
    pub want: Option<Want>,
    pub lifestyle: Option<Lifestyle>,
    pub target_weight: Option<f64>,
    pub target_workouts_weeks: Option<u32>,
    pub target_calories_daily: Option<u32>,
}

impl UserParams {
    pub fn apply(&mut self, update: UserParamsUpdate) {
        if let Some(height) = update.height {
            self.height = height;
        }
        if let Some(photo) = update.photo {
            self.photo = photo;
        }
        if let Some(want) = update.want {
            self.want = want;
        }
        if let Some(lifestyle) = update.lifestyle {
            self.lifestyle = lifestyle;
        }
        if let Some(weight) = update.target_weight {
            self.target_weight = weight;
        }
        if let Some(workouts) = update.target_workouts_weeks {
            self.target_workouts_weeks = workouts;
        }
        if let Some(calories) = update.target_calories_daily {
            self.target_calories_daily = calories;
        }
    }

    pub fn level_preparation(&self) -> LevelPreparation {
        self.lifestyle.to_level_preparation()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWeight {
    pub id: WeightId,
    pub user_id: UserId,
    pub weight: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserWeightUpdate {
    pub weight: Option<f64>,
    pub date: Option<DateTime<Utc>>,
}

impl UserWeight {
    pub fn apply(&mut self, update: UserWeightUpdate) {
        if let Some(weight) = update.weight {
            self.weight = weight;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
    }
}
