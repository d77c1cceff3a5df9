//! Text output formatting with colors.

use chrono::Local;

use otvet_core::{
    Answer, Category, Limits, Question, QuestionPreview, QuestionSearchResult, QuestionState,
    UserProfile,
};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ------------------------------------------------------------------
    // Listing rows
    // ------------------------------------------------------------------

    /// Two-line listing row for a question preview.
    pub fn question_row(&self, preview: &QuestionPreview) -> String {
        let question = &preview.question;
        let count = if question.poll_type.is_poll() {
            format!("{} votes", question.answer_count)
        } else {
            format!("{} answers", question.answer_count)
        };
        format!(
            "{} {} {}\n    {} · {} · {} · {}",
            self.dim(&format!("#{}", question.id)),
            self.state_tag(question.state),
            self.bold(&question.title),
            question.category.name,
            self.cyan(&preview.author.name),
            count,
            format_age(question.age_seconds),
        )
    }

    /// Two-line listing row for a search hit.
    pub fn search_row(&self, hit: &QuestionSearchResult) -> String {
        let state = match hit.state {
            Some(state) => format!("{} ", self.state_tag(state)),
            None => String::new(),
        };
        format!(
            "{} {}{}\n    {} · {} · {} answers · {}",
            self.dim(&format!("#{}", hit.id)),
            state,
            self.bold(&hit.title),
            hit.category.name,
            self.cyan(&hit.author.name),
            hit.answer_count,
            format_age(hit.age_seconds),
        )
    }

    /// Indented row of the category tree.
    pub fn category_row(&self, category: &Category, depth: usize) -> String {
        let indented = "  ".repeat(depth);
        let name = if depth == 0 {
            self.bold(&category.name)
        } else {
            category.name.clone()
        };
        let mut row = format!("{indented}{:<24} {name}", category.urlname);
        if category.is_readonly {
            row.push(' ');
            row.push_str(&self.dim("(read-only)"));
        }
        row
    }

    // ------------------------------------------------------------------
    // Detail views
    // ------------------------------------------------------------------

    /// Full question with its answers.
    pub fn question_detail(&self, question: &Question) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {} {}",
            self.state_tag(question.state),
            self.bold(&question.title),
            self.dim(&format!("#{}", question.id)),
        ));

        let mut meta = format!(
            "{} · asked {} by {}",
            question.category.name,
            format_age(question.age_seconds),
            self.cyan(&question.author.name),
        );
        if let Some(rate) = &question.author.rate {
            meta.push_str(&format!(" ({})", rate.name));
        }
        meta.push_str(&format!(" · {} answers", question.answer_count));
        if question.like_count > 0 {
            meta.push_str(&format!(" · {} likes", question.like_count));
        }
        lines.push(meta);
        lines.push(self.dim(&format!(
            "{} · {}",
            question.url(),
            question.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        )));

        if !question.text.is_empty() {
            lines.push(String::new());
            lines.push(question.text.clone());
        }

        for addition in &question.additions {
            lines.push(String::new());
            lines.push(format!(
                "{} {}",
                self.dim(&format!("Added {}:", format_age(addition.age_seconds))),
                addition.text
            ));
        }

        if let Some(poll) = &question.poll {
            lines.push(String::new());
            lines.push(self.bold(&format!("Poll · {} votes", poll.vote_count)));
            for option in &poll.options {
                let mark = if option.my_vote { "●" } else { "○" };
                lines.push(format!("  {mark} {} ({})", option.text, option.vote_count));
            }
        }

        if !question.answers.is_empty() {
            lines.push(String::new());
            lines.push(self.dim(&"─".repeat(60)));
            for answer in &question.answers {
                let is_best = question
                    .best_answer
                    .as_ref()
                    .is_some_and(|best| best.id == answer.id);
                lines.push(String::new());
                lines.push(self.answer_block(answer, is_best));
            }
        }

        lines.join("\n")
    }

    /// One answer, body indented under its header line.
    fn answer_block(&self, answer: &Answer, is_best: bool) -> String {
        let mut head = String::new();
        if is_best {
            head.push_str(&self.green("★ Best answer"));
            head.push_str(" · ");
        }
        head.push_str(&self.cyan(&answer.author.name));
        if let Some(rate) = &answer.author.rate {
            head.push_str(&format!(" ({})", rate.name));
        }
        head.push_str(&format!(" · {}", format_age(answer.age_seconds)));
        if answer.vote_count > 0 {
            head.push_str(&format!(" · {} votes", answer.vote_count));
        }
        if answer.like_count > 0 {
            head.push_str(&format!(" · {} likes", answer.like_count));
        }

        format!("{head}\n{}", indent(&answer.text, "  "))
    }

    /// Profile page.
    pub fn profile(&self, profile: &UserProfile) -> String {
        let mut lines = Vec::new();

        let mut name = self.bold(&profile.name);
        if profile.is_expert {
            name.push(' ');
            name.push_str(&self.green("[expert]"));
        }
        if profile.is_banned {
            name.push(' ');
            name.push_str(&self.yellow("[banned]"));
        }
        lines.push(name);
        lines.push(self.dim(&profile.url()));
        lines.push(String::new());

        lines.push(format!(
            "Rank:      {} (place {})",
            self.cyan(profile.rate.name),
            profile.place
        ));
        lines.push(format!(
            "Points:    {} (+{} this week)",
            profile.points, profile.week_points
        ));
        lines.push(format!("KPD:       {:.1}%", profile.kpd));
        lines.push(format!(
            "Answers:   {} ({} best, {} removed)",
            profile.answer_count, profile.best_answer_count, profile.deleted_answer_count
        ));
        lines.push(format!(
            "Questions: {} ({} open, {} voting, {} resolved)",
            profile.question_count,
            profile.open_question_count,
            profile.voting_question_count,
            profile.resolved_question_count
        ));
        lines.push(format!(
            "Social:    {} followers, {} following, {} blacklisted",
            profile.followers_count, profile.following_count, profile.blacklisted_count
        ));

        if let Some(own) = &profile.own_stats {
            lines.push(format!(
                "Own:       watching {}, asked directly {}, removed {}",
                own.watching_question_count,
                own.direct_question_count,
                own.removed_question_count
            ));
            if let Some(until) = own.banned_until {
                lines.push(self.yellow(&format!(
                    "Banned until {}",
                    until.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                )));
            }
        }

        if !profile.about.is_empty() {
            lines.push(String::new());
            lines.push(profile.about.clone());
        }

        lines.join("\n")
    }

    /// Remaining daily quotas.
    pub fn limits(&self, limits: &Limits) -> String {
        let mut lines = vec![self.bold("Left of today's quotas:")];
        let rows = [
            ("Questions", limits.current.questions, limits.total.questions),
            (
                "Direct questions",
                limits.current.direct_questions,
                limits.total.direct_questions,
            ),
            ("Answers", limits.current.answers, limits.total.answers),
            (
                "Best-answer votes",
                limits.current.best_answer_votes,
                limits.total.best_answer_votes,
            ),
            ("Poll votes", limits.current.poll_votes, limits.total.poll_votes),
            ("Likes", limits.current.likes, limits.total.likes),
            ("Photos", limits.current.photos, limits.total.photos),
            ("Videos", limits.current.videos, limits.total.videos),
            (
                "Recommendations",
                limits.current.best_question_recommends,
                limits.total.best_question_recommends,
            ),
        ];
        for (label, left, total) in rows {
            let value = format!("{left} / {total}");
            let value = if left == 0 { self.yellow(&value) } else { value };
            lines.push(format!("  {label:<18} {value}"));
        }
        lines.join("\n")
    }

    // ------------------------------------------------------------------
    // Color helpers
    // ------------------------------------------------------------------

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Bold when colors are on.
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn state_tag(&self, state: QuestionState) -> String {
        match state {
            QuestionState::Open => self.green("[open]"),
            QuestionState::Vote => self.yellow("[vote]"),
            QuestionState::Resolve => self.dim("[resolved]"),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Rough age like "3m ago"; precision drops with distance.
fn format_age(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const YEAR: u64 = 365 * DAY;

    match seconds {
        s if s < MINUTE => format!("{s}s ago"),
        s if s < HOUR => format!("{}m ago", s / MINUTE),
        s if s < DAY => format!("{}h ago", s / HOUR),
        s if s < YEAR => format!("{}d ago", s / DAY),
        s => format!("{}y ago", s / YEAR),
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Tests
// ============================================================================
