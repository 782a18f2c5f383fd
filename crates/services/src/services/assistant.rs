//! The "Pom" assistant: personality-keyed chat, client navigation intent,
//! task breakdown, and focus coaching.

use std::sync::LazyLock;

use db::models::preferences::PomPersonality;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::chat_api::{ChatApiClient, ChatApiError};

/// Destination pages and the words users call them by. Scanned top to
/// bottom; the first matching rule wins.
const NAV_TARGETS: &[(&str, &str)] = &[
    ("dashboard", "/dashboard"),
    ("home", "/dashboard"),
    ("main", "/dashboard"),
    ("start", "/dashboard"),
    ("begin", "/dashboard"),
    ("tasks", "/tasks"),
    ("task", "/tasks"),
    ("timer", "/timer"),
    ("pomodoro", "/timer"),
    ("sounds", "/sounds"),
    ("sound", "/sounds"),
    ("music", "/sounds"),
    ("notes", "/notes"),
    ("note", "/notes"),
    ("food", "/food"),
    ("foods", "/food"),
    ("recipe", "/food"),
    ("recipes", "/food"),
    ("cooking", "/food"),
    ("settings", "/settings"),
    ("setting", "/settings"),
    ("preferences", "/settings"),
];

/// Phrase templates tried for every target; `{}` is the target keyword.
const NAV_PHRASES: &[&str] = &[
    "take me to {}",
    "go to {}",
    "open {}",
    "show me {}",
    "navigate to {}",
    "bring me to {}",
    "take me {}",
    "go {}",
    "show {}",
    "open the {}",
    "i want to go to {}",
    "i want {}",
    "let's go to {}",
    "let's see {}",
    "can you take me to {}",
    "can you go to {}",
    "please take me to {}",
    "please go to {}",
];

const NAV_VERBS: &[&str] = &[
    "take", "go", "open", "show", "navigate", "bring", "see", "visit", "switch",
];

/// Decide whether a chat message is asking to move to another page.
///
/// Two rule sets, evaluated in order with first-match-wins: explicit
/// phrase templates per target, then a looser "target word anywhere plus a
/// navigation verb" rule.
pub fn navigation_target(message: &str) -> Option<&'static str> {
    let msg = message.to_lowercase();
    let msg = msg.trim();

    for &(keyword, path) in NAV_TARGETS {
        for phrase in NAV_PHRASES {
            let pattern = phrase.replace("{}", keyword);
            if msg.contains(&pattern) {
                return Some(path);
            }
        }
    }

    if NAV_VERBS.iter().any(|verb| msg.contains(verb)) {
        let words: Vec<&str> = msg.split_whitespace().collect();
        for &(keyword, path) in NAV_TARGETS {
            if words.contains(&keyword) || msg.contains(keyword) {
                return Some(path);
            }
        }
    }

    None
}

const NAVIGATION_NOTE: &str = "NAVIGATION: Available pages - Dashboard (/dashboard, also called \"home\", \"start\", \"main\"), Tasks (/tasks), Timer (/timer), Sounds (/sounds), Notes (/notes), Food (/food), Settings (/settings).";

/// System prompt for the requested personality, personalized with the
/// user's name.
pub fn system_prompt(personality: PomPersonality, user_name: &str) -> String {
    match personality {
        PomPersonality::StrictStructured => format!(
            "You are Pom, an AI assistant designed for people with ADHD. The user's name is {user_name}, but use it sparingly.\n\n\
             PERSONALITY: Strict & Structured\n\
             - Tone: Short, direct, no fluff. Give commands, not suggestions.\n\
             - Best for: Users who get overwhelmed by too many words or need external pressure.\n\
             - Behaviors: Very clear deadlines, no emotional tone, break tasks aggressively into steps.\n\
             - Example style: \"Start now. Step 1: Open your notes. Tell me when it's done.\"\n\
             - NO emojis. NO fluff. Be direct and actionable.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, acknowledge briefly and directly.\n\n\
             Always respond in English. Be direct and structured."
        ),
        PomPersonality::WarmAccountability => format!(
            "You are Pom, a friendly AI assistant designed for people with ADHD. The user's name is {user_name}, but only use it occasionally and naturally.\n\n\
             PERSONALITY: Warm Accountability Buddy\n\
             - Tone: Encouraging, calm, non-judgmental.\n\
             - Best for: Users who get paralyzed by fear of failure or self-criticism.\n\
             - Behaviors: Gentle reminders, validates frustration without excessive empathy, keeps focus without lecturing.\n\
             - Example style: \"Alright, we'll do this together. What's the first tiny step you can manage right now?\"\n\
             - Use emojis sparingly (🍎 🍒 🌟). Be warm but not overly emotional.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, acknowledge warmly and supportively.\n\n\
             Always respond in English. Be encouraging and non-judgmental."
        ),
        PomPersonality::HyperFocused => format!(
            "You are Pom, an energetic AI assistant designed for people with ADHD. The user's name is {user_name}, but use it sparingly.\n\n\
             PERSONALITY: Hyper-Focused Coach\n\
             - Tone: High-energy but organized.\n\
             - Best for: Users who need motivation spikes.\n\
             - Behaviors: Gamifies tasks, uses urgency but stays friendly, tracks streaks and wins.\n\
             - Example style: \"Okay — 8-minute power sprint. Timer on. Go.\"\n\
             - Use emojis for energy (⚡ 🎯 🏆). Be motivating and action-oriented.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, respond with energy and urgency.\n\n\
             Always respond in English. Be high-energy and motivating!"
        ),
        PomPersonality::MinimalistRobot => format!(
            "You are Pom, an AI assistant for people with ADHD. The user's name is {user_name}.\n\n\
             PERSONALITY: Minimalist Robot\n\
             - Tone: Emotionless, ultra-brief.\n\
             - Best for: Users overstimulated by too much personality.\n\
             - Behaviors: Bullet-point instructions, minimal text, NO emojis, NO adjectives.\n\
             - Example style: \"Plan: Email. Dishes. Break.\"\n\
             - NO emojis. NO adjectives. NO fluff. Just facts.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, respond with just the page name.\n\n\
             Always respond in English. Be minimal and factual."
        ),
        PomPersonality::FlexibleProblemSolver => format!(
            "You are Pom, an AI assistant designed for people with ADHD. The user's name is {user_name}.\n\n\
             PERSONALITY: Flexible Problem-Solver\n\
             - Tone: Analytical, calm, logical.\n\
             - Best for: Users who like understanding systems or need adaptive planning.\n\
             - Behaviors: Helps create step-by-step strategies, recalculates plans when users forget, helps with time-blocking.\n\
             - Example style: \"You have 2 hours free. Optimal sequence: X then Y then Z.\"\n\
             - Be analytical and systematic. Use logic and structure.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, provide logical reasoning.\n\n\
             Always respond in English. Be analytical and structured."
        ),
        PomPersonality::CalmMonk => format!(
            "You are Pom, a calm AI assistant for people with ADHD. The user's name is {user_name}.\n\n\
             PERSONALITY: Calm Monk\n\
             - Tone: Slow, grounding, minimalist.\n\
             - Best for: Users who are overwhelmed, anxious, or overstimulated.\n\
             - Behaviors: Encourages micro-breaks, helps regulate with pacing, uses extremely clear language.\n\
             - Example style: \"Pause. One breath. Now tell me one task you want to finish.\"\n\
             - NO emojis. Be calm and grounding. Use pauses and breathing cues.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, respond calmly and slowly.\n\n\
             Always respond in English. Be calm and grounding."
        ),
        PomPersonality::CompassionateFirm => format!(
            "You are Pom, an AI assistant for people with ADHD. The user's name is {user_name}, but use it sparingly.\n\n\
             PERSONALITY: Compassionate but Firm Supervisor\n\
             - Tone: Kind but strict.\n\
             - Best for: Users who need accountability plus reassurance.\n\
             - Behaviors: Makes you commit to tasks, asks for check-ins, gives gentle pressure.\n\
             - Example style: \"I know you can do this. I'll check back in 10 minutes — be ready.\"\n\
             - Be kind but firm. Use emojis sparingly (🍎). Balance support with accountability.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, acknowledge with kindness but maintain structure.\n\n\
             Always respond in English. Be compassionate but firm."
        ),
        PomPersonality::ChaosWrangler => format!(
            "You are Pom, a flexible AI assistant for people with ADHD. The user's name is {user_name}.\n\n\
             PERSONALITY: Chaos Wrangler\n\
             - Tone: Casual, understanding of ADHD randomness.\n\
             - Best for: Users whose environment or brain is unpredictable.\n\
             - Behaviors: Adapts rapidly, helps sort scattered tasks, doesn't require linear thinking.\n\
             - Example style: \"Drop every thought you have right now. I'll sort them for you.\"\n\
             - Be casual and adaptable. Use emojis naturally (🍎 🎯). Embrace the chaos.\n\n\
             {NAVIGATION_NOTE}\n\
             When user asks to navigate, respond casually and flexibly.\n\n\
             Always respond in English. Be casual and adaptable!"
        ),
    }
}

const FOCUS_PLAN_SYSTEM: &str = "You are an ADHD coach who gives practical and encouraging advice. Respond in English in a concise and actionable manner.";

const BREAKDOWN_SYSTEM: &str = "You are an ADHD-friendly task breakdown assistant. Break down tasks into very small, specific, actionable steps that take 5-15 minutes each. Each step should:\n\
1. Be extremely specific with action verbs (e.g., 'Open Word document' not 'Start writing')\n\
2. Include a time estimate in parentheses (e.g., 'Pick up all clothes from floor (5 min)')\n\
3. Be sequential (step 2 depends on step 1)\n\
4. Be achievable in 5-15 minutes\n\
5. Use clear, simple language\n\n\
Format: First, provide a total time estimate for the entire task, then list the steps.\n\
TOTAL_TIME: [total minutes]\n\n\
1. Step description (X min)\n\
2. Step description (X min)\n\
...\n\n\
Example:\n\
TOTAL_TIME: 45\n\n\
1. Open Word document (2 min)\n\
2. Create essay outline with headings (5 min)\n\
3. Write introduction paragraph (10 min)\n\
4. Find 3 sources for body paragraphs (10 min)\n\
5. Write first body paragraph (15 min)\n\
6. Write second body paragraph (15 min)\n\
7. Write conclusion paragraph (8 min)\n\
8. Review and proofread (10 min)\n\
Do not include any explanation or additional text.";

/// What the assistant answered, plus an optional client-side navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigate_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBreakdown {
    pub steps: Vec<String>,
    pub total_time: Option<u32>,
}

static TOTAL_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)TOTAL_TIME:\s*(\d+)").unwrap());
static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d+[.)]\s*(.+?)\s*\((\d+)\s*min(?:ute)?s?\)").unwrap());
static STEP_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").unwrap());
static TIME_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\d+\s*min(?:ute)?s?\)").unwrap());

/// Parse the model's breakdown into steps with time estimates. Lines that
/// don't carry an estimate get a 10-minute default so the client can
/// always sum them.
pub fn parse_breakdown(response: &str) -> TaskBreakdown {
    let total_time = TOTAL_TIME_RE
        .captures(response)
        .and_then(|c| c[1].parse().ok());

    let steps = response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && STEP_PREFIX_RE.is_match(line))
        .map(|line| {
            if let Some(c) = STEP_RE.captures(line) {
                format!("{} ({} min)", c[1].trim(), &c[2])
            } else {
                let step = STEP_PREFIX_RE.replace(line, "").trim().to_string();
                if TIME_SUFFIX_RE.is_match(&step) {
                    step
                } else {
                    format!("{step} (10 min)")
                }
            }
        })
        .filter(|step| !step.is_empty())
        .collect();

    TaskBreakdown { steps, total_time }
}

#[derive(Debug, Clone)]
pub struct AssistantService {
    chat: ChatApiClient,
}

impl AssistantService {
    pub fn new(chat: ChatApiClient) -> Self {
        Self { chat }
    }

    /// Answer a chat message in the user's chosen personality, and detect
    /// navigation intent locally (the model never decides navigation).
    pub async fn chat(
        &self,
        user_name: &str,
        personality: PomPersonality,
        message: &str,
    ) -> Result<ChatReply, ChatApiError> {
        let navigate_to = navigation_target(message).map(str::to_string);
        let system = system_prompt(personality, user_name);

        let response = self.chat.ask(message, Some(system), 500).await?;

        Ok(ChatReply {
            response,
            navigate_to,
        })
    }

    pub async fn focus_plan(&self, topic: &str) -> Result<String, ChatApiError> {
        self.chat
            .ask(
                &format!("Give me advice on: {topic}"),
                Some(FOCUS_PLAN_SYSTEM.to_string()),
                500,
            )
            .await
    }

    pub async fn task_breakdown(&self, task: &str) -> Result<TaskBreakdown, ChatApiError> {
        let response = self
            .chat
            .ask(
                &format!(
                    "Break down this task into ADHD-friendly micro-steps with time estimates: {task}"
                ),
                Some(BREAKDOWN_SYSTEM.to_string()),
                1000,
            )
            .await?;

        Ok(parse_breakdown(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_rules_match_explicit_requests() {
        assert_eq!(navigation_target("take me to tasks"), Some("/tasks"));
        assert_eq!(navigation_target("Please go to settings"), Some("/settings"));
        assert_eq!(navigation_target("can you take me to the timer"), Some("/timer"));
        assert_eq!(navigation_target("open notes"), Some("/notes"));
    }

    #[test]
    fn keyword_plus_verb_rule_catches_looser_phrasing() {
        assert_eq!(navigation_target("let me see my recipes now"), Some("/food"));
        assert_eq!(navigation_target("switch over to the pomodoro thing"), Some("/timer"));
    }

    #[test]
    fn home_aliases_resolve_to_the_dashboard() {
        assert_eq!(navigation_target("take me home"), Some("/dashboard"));
        assert_eq!(navigation_target("go to dashboard"), Some("/dashboard"));
    }

    #[test]
    fn plain_conversation_does_not_navigate() {
        assert_eq!(navigation_target("i'm feeling overwhelmed today"), None);
        assert_eq!(navigation_target("what should i cook for dinner?"), None);
    }

    #[test]
    fn earlier_rules_win() {
        // "dashboard" is listed before "tasks"; an explicit dashboard
        // phrase wins even when other target words appear later.
        assert_eq!(
            navigation_target("go to dashboard and then maybe tasks"),
            Some("/dashboard")
        );
    }

    #[test]
    fn every_personality_prompt_mentions_the_user() {
        for personality in [
            PomPersonality::StrictStructured,
            PomPersonality::WarmAccountability,
            PomPersonality::HyperFocused,
            PomPersonality::MinimalistRobot,
            PomPersonality::FlexibleProblemSolver,
            PomPersonality::CalmMonk,
            PomPersonality::CompassionateFirm,
            PomPersonality::ChaosWrangler,
        ] {
            let prompt = system_prompt(personality, "Alex");
            assert!(prompt.contains("Alex"), "{personality} prompt misses name");
            assert!(prompt.contains("NAVIGATION:"), "{personality} prompt misses navigation");
        }
    }

    #[test]
    fn breakdown_parses_steps_and_total() {
        let response = "TOTAL_TIME: 45\n\n\
                        1. Open Word document (2 min)\n\
                        2. Create outline (5 min)\n\
                        3) Write introduction (10 minutes)\n\
                        Some stray commentary line\n\
                        4. Review everything";

        let breakdown = parse_breakdown(response);

        assert_eq!(breakdown.total_time, Some(45));
        assert_eq!(
            breakdown.steps,
            vec![
                "Open Word document (2 min)",
                "Create outline (5 min)",
                "Write introduction (10 min)",
                "Review everything (10 min)",
            ]
        );
    }

    #[test]
    fn breakdown_of_empty_response_is_empty() {
        let breakdown = parse_breakdown("Sorry, I cannot help with that.");
        assert!(breakdown.steps.is_empty());
        assert_eq!(breakdown.total_time, None);
    }
}
