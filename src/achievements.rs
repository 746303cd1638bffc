use std::collections::{HashMap, HashSet};

use strum_macros::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum Category {
    Speed,
    Accuracy,
    Fun,
    Milestone,
    Consistency,
}

/// Snapshot the evaluator judges against. Current-session fields come from
/// the finished session; lifetime fields from the history store.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AchievementStats {
    pub wpm: f64,
    pub error_rate: f64,
    pub duration_secs: f64,
    pub tests_completed: u64,
    pub best_wpm: f64,
    pub daily_streak: u32,
    pub minutes_today: f64,
    pub bonus_time_uses: u64,
}

type Predicate = fn(&AchievementStats) -> bool;
type ProgressFn = fn(&AchievementStats) -> u64;

/// One immutable catalog entry. Predicates are pure functions of the stats
/// snapshot; `progress` pairs a stat extractor with the denominator shown in
/// partial-completion bars.
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub subtitle: &'static str,
    pub category: Category,
    pub predicate: Predicate,
    pub progress: Option<(ProgressFn, u64)>,
}

/// Catalog order is the notification order: when several entries unlock in
/// one pass, the earliest is the one surfaced to the user.
static CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first-steps",
        name: "First Steps",
        subtitle: "Finish your first test",
        category: Category::Milestone,
        predicate: |s| s.tests_completed >= 1,
        progress: None,
    },
    AchievementDef {
        id: "rookie-rocket",
        name: "Rookie Rocket",
        subtitle: "Reach 40 wpm",
        category: Category::Speed,
        predicate: |s| s.wpm >= 40.0,
        progress: None,
    },
    AchievementDef {
        id: "highway-eighty",
        name: "Highway Eighty",
        subtitle: "Reach 80 wpm",
        category: Category::Speed,
        predicate: |s| s.wpm >= 80.0,
        progress: None,
    },
    AchievementDef {
        id: "hundred-club",
        name: "Hundred Club",
        subtitle: "Reach 100 wpm",
        category: Category::Speed,
        predicate: |s| s.wpm >= 100.0,
        progress: None,
    },
    AchievementDef {
        id: "the-one",
        name: "The One",
        subtitle: "Reach 150 wpm",
        category: Category::Speed,
        predicate: |s| s.wpm >= 150.0,
        progress: None,
    },
    AchievementDef {
        id: "clean-sheet",
        name: "Clean Sheet",
        subtitle: "Finish a test without a single error",
        category: Category::Accuracy,
        predicate: |s| s.error_rate == 0.0 && s.wpm > 0.0,
        progress: None,
    },
    AchievementDef {
        id: "sharpshooter",
        name: "Sharpshooter",
        subtitle: "Keep the error rate under 2%",
        category: Category::Accuracy,
        predicate: |s| s.error_rate < 2.0 && s.wpm > 0.0,
        progress: None,
    },
    AchievementDef {
        id: "ten-up",
        name: "Ten Up",
        subtitle: "Complete 10 tests",
        category: Category::Milestone,
        predicate: |s| s.tests_completed >= 10,
        progress: Some((|s| s.tests_completed, 10)),
    },
    AchievementDef {
        id: "test-centurion",
        name: "Test Centurion",
        subtitle: "Complete 100 tests",
        category: Category::Milestone,
        predicate: |s| s.tests_completed >= 100,
        progress: Some((|s| s.tests_completed, 100)),
    },
    AchievementDef {
        id: "marathon-day",
        name: "Marathon Day",
        subtitle: "Type for 30 minutes in one day",
        category: Category::Milestone,
        predicate: |s| s.minutes_today >= 30.0,
        progress: Some((|s| s.minutes_today as u64, 30)),
    },
    AchievementDef {
        id: "three-peat",
        name: "Three-peat",
        subtitle: "Practice three days in a row",
        category: Category::Consistency,
        predicate: |s| s.daily_streak >= 3,
        progress: Some((|s| s.daily_streak as u64, 3)),
    },
    AchievementDef {
        id: "seven-wonders",
        name: "Seven Wonders",
        subtitle: "Practice a full week in a row",
        category: Category::Consistency,
        predicate: |s| s.daily_streak >= 7,
        progress: Some((|s| s.daily_streak as u64, 7)),
    },
    AchievementDef {
        id: "personal-best",
        name: "Personal Best",
        subtitle: "Beat your own record",
        category: Category::Fun,
        predicate: |s| s.tests_completed >= 2 && s.wpm >= s.best_wpm && s.wpm > 0.0,
        progress: None,
    },
    AchievementDef {
        id: "time-lord",
        name: "Time Lord",
        subtitle: "Discover the bonus-time chord",
        category: Category::Fun,
        predicate: |s| s.bonus_time_uses >= 1,
        progress: None,
    },
    AchievementDef {
        id: "time-bandit",
        name: "Time Bandit",
        subtitle: "Steal bonus time 25 times",
        category: Category::Fun,
        predicate: |s| s.bonus_time_uses >= 25,
        progress: Some((|s| s.bonus_time_uses, 25)),
    },
];

pub fn catalog() -> &'static [AchievementDef] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    CATALOG.iter().find(|def| def.id == id)
}

/// Result of one evaluation pass.
pub struct Evaluation {
    /// Everything that unlocked this pass, in catalog order.
    pub newly_unlocked: Vec<&'static AchievementDef>,
    /// The single entry surfaced as "the" notification: the earliest newly
    /// unlocked one. The rest unlock silently.
    pub notification: Option<&'static AchievementDef>,
    /// Partial progress per entry that declares a denominator, capped at the
    /// denominator and computed regardless of unlock state.
    pub progress_by_id: HashMap<&'static str, u64>,
}

/// Evaluate the catalog against a stats snapshot. Pure over its inputs, so
/// repeating a call with the updated unlocked set yields nothing new.
pub fn evaluate(stats: &AchievementStats, previously_unlocked: &HashSet<String>) -> Evaluation {
    let mut newly_unlocked = Vec::new();
    let mut progress_by_id = HashMap::new();

    for def in CATALOG {
        if let Some((extract, max)) = def.progress {
            progress_by_id.insert(def.id, extract(stats).min(max));
        }
        if !previously_unlocked.contains(def.id) && (def.predicate)(stats) {
            newly_unlocked.push(def);
        }
    }

    Evaluation {
        notification: newly_unlocked.first().copied(),
        newly_unlocked,
        progress_by_id,
    }
}
