//! Prompt assembly for the judging panel.
//!
//! Builds the evaluation prompt each judge answers in Round 1 and the verdict
//! prompt used after community voting. Prompts are plain strings; turning them
//! into generation requests is the caller's concern.

use crate::community::ReactionTally;
use crate::judges::persona;
use crate::types::{Criterion, Judge, JudgeScore, ProjectFields, ScoreNotes};

/// Research findings longer than this are truncated in prompts.
const MAX_RESEARCH_CHARS: usize = 6_000;

/// A system/user prompt pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgePrompt {
    pub system: String,
    pub user: String,
}

/// Assembles judge prompts.
pub struct PromptAssembler;

impl PromptAssembler {
    /// Build the in-character system prompt for a judge.
    pub fn build_system_prompt(judge: Judge) -> String {
        let persona = persona(judge);
        let mut prompt = String::new();

        prompt.push_str("# CLANK TANK JUDGING PANEL\n\n");
        prompt.push_str("You are one of four judges on a hackathon game show.\n");
        prompt.push_str("Stay in character and judge honestly.\n\n");
        prompt.push_str(&persona.prompt_fragment());
        prompt.push_str(&format!("\n\nYour focus: {}.\n", persona.focus()));

        prompt
    }

    /// Build the Round 1 evaluation prompt for one judge and submission.
    pub fn build_evaluation_prompt(
        judge: Judge,
        project: &ProjectFields,
        research: Option<&str>,
    ) -> JudgePrompt {
        let mut user = String::new();

        user.push_str("# SUBMISSION\n\n");
        user.push_str(&format!("Project: {}\n", project.project_name));
        if !project.team_name.is_empty() {
            user.push_str(&format!("Team: {}\n", project.team_name));
        }
        if !project.category.is_empty() {
            user.push_str(&format!("Category: {}\n", project.category));
        }
        user.push_str(&format!("\nDescription:\n{}\n", project.description));

        let links = project.links();
        if !links.is_empty() {
            user.push_str("\nLinks:\n");
            for (label, url) in links {
                user.push_str(&format!("- {}: {}\n", label, url));
            }
        }

        if !project.extra.is_empty() {
            user.push_str("\nAdditional details:\n");
            for (key, value) in &project.extra {
                user.push_str(&format!("- {}: {}\n", key, value));
            }
        }

        if let Some(research) = research.map(str::trim).filter(|r| !r.is_empty()) {
            user.push_str("\n# RESEARCH FINDINGS\n\n");
            user.push_str(truncate(research, MAX_RESEARCH_CHARS));
            user.push('\n');
        }

        user.push_str("\n# SCORING\n\n");
        user.push_str("Score each criterion from 0 to 10 (whole numbers):\n");
        for criterion in Criterion::ALL {
            user.push_str(&format!("- {}\n", criterion.title()));
        }

        user.push_str("\nReply in exactly this format, one item per line:\n\n");
        for criterion in Criterion::ALL {
            user.push_str(&format!("{}: <0-10>\n", criterion.score_label()));
            user.push_str(&format!(
                "{}: <one or two sentences in your voice>\n",
                criterion.reason_label()
            ));
        }
        user.push_str("OVERALL_COMMENT: <one line summing up your take>\n");

        JudgePrompt {
            system: Self::build_system_prompt(judge),
            user,
        }
    }

    /// Build the Round 2 verdict prompt.
    ///
    /// The judge sees its own Round 1 reasoning and the community reaction
    /// breakdown, and is asked whether the feedback changes its stance.
    pub fn build_verdict_prompt(
        round_one: &JudgeScore,
        project: &ProjectFields,
        reactions: &ReactionTally,
        final_score: f64,
    ) -> JudgePrompt {
        let mut user = String::new();

        user.push_str(&format!("# FINAL VERDICT: {}\n\n", project.project_name));
        user.push_str(&format!(
            "Your Round 1 weighted score was {:.2}.\n\n",
            round_one.weighted_total
        ));

        if let ScoreNotes::Evaluation(notes) = &round_one.notes {
            user.push_str("Your Round 1 reasoning:\n");
            for (criterion, reason) in notes.reasons.iter() {
                let score = round_one.scores.get(criterion);
                if reason.is_empty() {
                    user.push_str(&format!("- {} ({}/10)\n", criterion.title(), score));
                } else {
                    user.push_str(&format!("- {} ({}/10): {}\n", criterion.title(), score, reason));
                }
            }
            if !notes.overall_comment.is_empty() {
                user.push_str(&format!("Overall: {}\n", notes.overall_comment));
            }
        }

        user.push_str(&format!(
            "\nThe community reacted {} times:\n{}\n",
            reactions.total(),
            reactions.breakdown()
        ));
        user.push_str(&format!(
            "\nWith the community bonus the final score is {:.2}.\n",
            final_score
        ));
        user.push_str(
            "\nDoes the community feedback change your stance? Give your final verdict \
             in at most two sentences, in character. Reply with the verdict only.\n",
        );

        JudgePrompt {
            system: Self::build_system_prompt(round_one.judge),
            user,
        }
    }

    /// Deterministic verdict used when verdict generation fails.
    pub fn fallback_verdict(judge: Judge, final_score: f64) -> String {
        format!(
            "{} has weighed the community feedback and settles on a final score of {:.2}.",
            judge.display_name(),
            final_score
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
