//! Fixed dashboard queries. They skip generation but still go through validation.

use std::fmt;
use std::str::FromStr;

const USAGE_ANALYTICS_SQL: &str = r#"WITH daily_prompts AS (
    SELECT ph.user_id, DATE_TRUNC('day', ph.created_at) AS prompt_date, COUNT(ph.prompt_id) AS prompts_per_day
    FROM prompt_history ph
    WHERE ph.user_id NOT IN (329, 136)
    GROUP BY ph.user_id, DATE_TRUNC('day', ph.created_at)
),
user_avg_prompts AS (
    SELECT dp.user_id, AVG(dp.prompts_per_day) AS avg_prompts_per_day, SUM(dp.prompts_per_day) AS total_prompts, COUNT(dp.prompt_date) AS total_days
    FROM daily_prompts dp
    GROUP BY dp.user_id
),
user_details AS (
    SELECT u.user_id, u.name, u.email, u.created_at
    FROM usertable u
    WHERE u.user_id NOT IN (329, 136)
)
SELECT
    ud.user_id,
    ud.name,
    ud.email,
    ud.created_at,
    uap.avg_prompts_per_day,
    uap.total_prompts,
    uap.total_days,
    ROUND(uap.total_prompts / 30.0, 2) AS calculated_avg_prompts_per_day
FROM user_details ud
JOIN user_avg_prompts uap ON ud.user_id = uap.user_id
ORDER BY ud.user_id"#;

const TOTAL_USERS_SQL: &str = "SELECT COUNT(DISTINCT user_id) AS total_users FROM usertable";

const AVERAGE_DAILY_USERS_SQL: &str = r#"WITH daily_users AS (
    SELECT DATE_TRUNC('day', created_at) AS day, COUNT(DISTINCT user_id) AS daily_count
    FROM usertable
    GROUP BY DATE_TRUNC('day', created_at)
)
SELECT ROUND(AVG(daily_count), 1) AS average_daily_users
FROM daily_users"#;

const AVERAGE_WEEKLY_USERS_SQL: &str = r#"WITH daily_users AS (
    SELECT DATE_TRUNC('day', created_at) AS day, COUNT(DISTINCT user_id) AS daily_count
    FROM usertable
    GROUP BY DATE_TRUNC('day', created_at)
),
weekly_users AS (
    SELECT DATE_TRUNC('week', day) AS week, AVG(daily_count) AS weekly_avg
    FROM daily_users
    GROUP BY DATE_TRUNC('week', day)
)
SELECT ROUND(AVG(weekly_avg), 1) AS average_weekly_users
FROM weekly_users"#;

const MOST_USED_MODEL_SQL: &str = r#"SELECT llm_used, COUNT(*) AS count
FROM prompt_review
GROUP BY llm_used
ORDER BY count DESC
LIMIT 1"#;

const TOTAL_ENHANCED_PROMPTS_SQL: &str = "SELECT COUNT(id) AS total_prompts FROM prompt_review";

const PROMPT_REVIEWS_SQL: &str = r#"SELECT
    u.name AS user_name,
    u.email,
    pr.prompt,
    pr.enhanced_prompt,
    pr.domain,
    pr.created_at,
    pr.processing_time_ms
FROM public.prompt_review pr
JOIN public.usertable u ON pr.user_id = u.user_id
ORDER BY pr.created_at DESC"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CannedQuery {
    /// Per-user daily prompt statistics; the default dashboard view
    UsageAnalytics,
    TotalUsers,
    AverageDailyUsers,
    AverageWeeklyUsers,
    MostUsedModel,
    TotalEnhancedPrompts,
    PromptReviews,
}

impl CannedQuery {
    pub const ALL: [CannedQuery; 7] = [
        CannedQuery::UsageAnalytics,
        CannedQuery::TotalUsers,
        CannedQuery::AverageDailyUsers,
        CannedQuery::AverageWeeklyUsers,
        CannedQuery::MostUsedModel,
        CannedQuery::TotalEnhancedPrompts,
        CannedQuery::PromptReviews,
    ];

    /// Single-value headline metrics, in dashboard order
    pub const METRICS: [CannedQuery; 5] = [
        CannedQuery::TotalUsers,
        CannedQuery::AverageDailyUsers,
        CannedQuery::AverageWeeklyUsers,
        CannedQuery::MostUsedModel,
        CannedQuery::TotalEnhancedPrompts,
    ];

    pub fn sql(&self) -> &'static str {
        match self {
            CannedQuery::UsageAnalytics => USAGE_ANALYTICS_SQL,
            CannedQuery::TotalUsers => TOTAL_USERS_SQL,
            CannedQuery::AverageDailyUsers => AVERAGE_DAILY_USERS_SQL,
            CannedQuery::AverageWeeklyUsers => AVERAGE_WEEKLY_USERS_SQL,
            CannedQuery::MostUsedModel => MOST_USED_MODEL_SQL,
            CannedQuery::TotalEnhancedPrompts => TOTAL_ENHANCED_PROMPTS_SQL,
            CannedQuery::PromptReviews => PROMPT_REVIEWS_SQL,
        }
    }

    /// Stable identifier used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            CannedQuery::UsageAnalytics => "usage",
            CannedQuery::TotalUsers => "total-users",
            CannedQuery::AverageDailyUsers => "daily-users",
            CannedQuery::AverageWeeklyUsers => "weekly-users",
            CannedQuery::MostUsedModel => "top-model",
            CannedQuery::TotalEnhancedPrompts => "enhanced-prompts",
            CannedQuery::PromptReviews => "reviews",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CannedQuery::UsageAnalytics => "Prompt usage analytics",
            CannedQuery::TotalUsers => "Total users",
            CannedQuery::AverageDailyUsers => "Avg daily users",
            CannedQuery::AverageWeeklyUsers => "Avg weekly users",
            CannedQuery::MostUsedModel => "Most used AI",
            CannedQuery::TotalEnhancedPrompts => "Enhanced prompts",
            CannedQuery::PromptReviews => "Prompt reviews",
        }
    }

    pub fn is_metric(&self) -> bool {
        Self::METRICS.contains(self)
    }
}

impl fmt::Display for CannedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CannedQuery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|q| q.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|q| q.name()).collect();
                format!("unknown view '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
