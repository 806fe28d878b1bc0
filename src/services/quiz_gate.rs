//! 测验关卡 - 业务能力层
//!
//! 固定顺序的单选题，答对比例达到及格线才进入正式标注

use crate::error::{AppError, AppResult, WorkflowError};
use crate::models::{QuizAnswer, QuizQuestion};
use std::collections::HashSet;
use std::fmt::Display;
use tracing::{debug, info, warn};

/// 关卡状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Answering(usize),
    Feedback {
        question_index: usize,
        /// 当前题的所有选项都已提交过
        all_answered: bool,
    },
    Passed,
    Rejected,
}

impl Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuizPhase::Answering(i) => write!(f, "Answering({})", i),
            QuizPhase::Feedback {
                question_index,
                all_answered,
            } => write!(f, "Feedback({}, {})", question_index, all_answered),
            QuizPhase::Passed => write!(f, "Passed"),
            QuizPhase::Rejected => write!(f, "Rejected"),
        }
    }
}

/// 答题进度
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizState {
    pub question_index: usize,
    pub selected_answer_id: Option<String>,
    /// 当前题已提交过的选项
    pub submitted_answer_ids: HashSet<String>,
    pub correct_count: usize,
}

/// 一次提交的反馈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizFeedback {
    pub answer: QuizAnswer,
    /// 是否第一次提交该选项；重复提交为 false 且不计分
    pub newly_submitted: bool,
}

pub struct QuizGate {
    questions: Vec<QuizQuestion>,
    pass_threshold: f64,
    state: QuizState,
    phase: QuizPhase,
}

impl QuizGate {
    /// 没有题目的测验直接通过
    pub fn new(questions: Vec<QuizQuestion>, pass_threshold: f64) -> Self {
        let phase = if questions.is_empty() {
            QuizPhase::Passed
        } else {
            QuizPhase::Answering(0)
        };
        Self {
            questions,
            pass_threshold,
            state: QuizState::default(),
            phase,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, QuizPhase::Passed | QuizPhase::Rejected)
    }

    /// 当前题目，关卡结束后为 `None`
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.is_finished() {
            return None;
        }
        self.questions.get(self.state.question_index)
    }

    fn ensure_answerable(&self, action: &'static str) -> AppResult<&QuizQuestion> {
        match self.phase {
            QuizPhase::Answering(_) | QuizPhase::Feedback { .. } => self
                .current_question()
                .ok_or_else(|| AppError::invalid_transition(action, self.phase)),
            _ => Err(AppError::invalid_transition(action, self.phase)),
        }
    }

    /// 选择一个选项（提交前可以反复更换）
    pub fn select(&mut self, answer_id: &str) -> AppResult<()> {
        let question = self.ensure_answerable("select")?;
        if question.answer(answer_id).is_none() {
            return Err(WorkflowError::UnknownAnswer(answer_id.to_string()).into());
        }
        self.state.selected_answer_id = Some(answer_id.to_string());
        Ok(())
    }

    /// 提交已选选项，进入反馈状态
    ///
    /// 同一个选项重复提交不会再计分
    pub fn submit(&mut self) -> AppResult<QuizFeedback> {
        let question = self.ensure_answerable("submit")?;
        let selected = self
            .state
            .selected_answer_id
            .clone()
            .ok_or_else(|| AppError::invalid_transition("submit", "未选择选项"))?;
        let answer = question
            .answer(&selected)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownAnswer(selected.clone()))?;
        // 按不同的选项ID计数，重复ID不会让题目永远无法继续
        let answer_count = question
            .answers
            .iter()
            .map(|a| a.id.as_str())
            .collect::<HashSet<_>>()
            .len();

        let newly_submitted = self.state.submitted_answer_ids.insert(selected);
        if newly_submitted && answer.correct {
            self.state.correct_count += 1;
        }

        let all_answered = self.state.submitted_answer_ids.len() == answer_count;
        self.phase = QuizPhase::Feedback {
            question_index: self.state.question_index,
            all_answered,
        };
        debug!(
            "测验第 {} 题提交 {} (正确: {}, 累计答对: {})",
            self.state.question_index + 1,
            answer.id,
            answer.correct,
            self.state.correct_count
        );

        Ok(QuizFeedback {
            answer,
            newly_submitted,
        })
    }

    /// 能否进入下一题
    ///
    /// 必须已经提交过正确选项；没有正确选项的题目要求所有选项都提交过
    pub fn can_continue(&self) -> bool {
        let QuizPhase::Feedback { all_answered, .. } = self.phase else {
            return false;
        };
        match self.current_question().and_then(QuizQuestion::correct_answer) {
            Some(correct) => self.state.submitted_answer_ids.contains(&correct.id),
            None => all_answered,
        }
    }

    /// 进入下一题；最后一题之后给出通过或拒绝
    pub fn advance(&mut self) -> AppResult<QuizPhase> {
        if !self.can_continue() {
            return Err(AppError::invalid_transition("continue", self.phase));
        }

        let next_index = self.state.question_index + 1;
        if next_index < self.questions.len() {
            self.state.question_index = next_index;
            self.state.selected_answer_id = None;
            self.state.submitted_answer_ids.clear();
            self.phase = QuizPhase::Answering(next_index);
            return Ok(self.phase);
        }

        self.state.question_index = self.questions.len();
        let ratio = self.pass_ratio();
        if ratio >= self.pass_threshold {
            info!("✅ 测验通过 ({:.0}%)", ratio * 100.0);
            self.phase = QuizPhase::Passed;
        } else {
            warn!(
                "❌ 测验未通过 ({:.0}% < {:.0}%)",
                ratio * 100.0,
                self.pass_threshold * 100.0
            );
            self.phase = QuizPhase::Rejected;
        }
        Ok(self.phase)
    }

    pub fn pass_ratio(&self) -> f64 {
        if self.questions.is_empty() {
            return 1.0;
        }
        self.state.correct_count as f64 / self.questions.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::default_questions;

    fn question(id: &str, correct: Option<&str>) -> QuizQuestion {
        QuizQuestion {
            prompt: format!("question {}", id),
            answers: ["a", "b"]
                .iter()
                .map(|suffix| QuizAnswer {
                    id: format!("{}-{}", id, suffix),
                    text: suffix.to_string(),
                    correct: correct == Some(*suffix),
                    explanation: None,
                })
                .collect(),
        }
    }

    fn answer(gate: &mut QuizGate, id: &str) -> QuizFeedback {
        gate.select(id).unwrap();
        gate.submit().unwrap()
    }

    #[test]
    fn passes_after_correcting_a_wrong_answer() {
        let mut gate = QuizGate::new(vec![question("q1", Some("a")), question("q2", Some("b"))], 0.5);

        assert!(answer(&mut gate, "q1-a").answer.correct);
        assert_eq!(gate.advance().unwrap(), QuizPhase::Answering(1));

        assert!(!answer(&mut gate, "q2-a").answer.correct);
        assert!(!gate.can_continue());
        assert!(gate.advance().is_err());

        assert!(answer(&mut gate, "q2-b").answer.correct);
        assert_eq!(
            gate.phase(),
            QuizPhase::Feedback {
                question_index: 1,
                all_answered: true
            }
        );
        assert_eq!(gate.state().correct_count, 2);
        assert_eq!(gate.advance().unwrap(), QuizPhase::Passed);
        assert_eq!(gate.pass_ratio(), 1.0);
    }

    #[test]
    fn rejects_when_nothing_is_correct() {
        let mut gate = QuizGate::new(vec![question("q1", None), question("q2", None)], 0.5);

        answer(&mut gate, "q1-a");
        assert!(!gate.can_continue());
        answer(&mut gate, "q1-b");
        assert!(gate.can_continue());
        gate.advance().unwrap();

        answer(&mut gate, "q2-b");
        answer(&mut gate, "q2-a");
        assert_eq!(gate.state().correct_count, 0);
        assert_eq!(gate.advance().unwrap(), QuizPhase::Rejected);
        assert!(gate.current_question().is_none());
    }

    #[test]
    fn resubmitting_same_answer_is_a_no_op() {
        let mut gate = QuizGate::new(vec![question("q1", Some("a"))], 0.5);

        let first = answer(&mut gate, "q1-a");
        assert!(first.newly_submitted);
        assert_eq!(gate.state().correct_count, 1);

        let second = gate.submit().unwrap();
        assert!(!second.newly_submitted);
        assert_eq!(gate.state().correct_count, 1);
        assert_eq!(gate.state().submitted_answer_ids.len(), 1);
    }

    #[test]
    fn unknown_answer_and_missing_selection_are_errors() {
        let mut gate = QuizGate::new(default_questions(), 0.5);
        assert!(gate.submit().is_err());
        assert!(gate.select("nope").is_err());
        assert_eq!(gate.phase(), QuizPhase::Answering(0));
    }

    #[test]
    fn empty_quiz_passes_immediately() {
        let gate = QuizGate::new(Vec::new(), 0.5);
        assert_eq!(gate.phase(), QuizPhase::Passed);
        assert!(gate.is_finished());
    }

    #[test]
    fn threshold_is_configurable() {
        let mut gate = QuizGate::new(vec![question("q1", Some("a")), question("q2", None)], 0.75);
        answer(&mut gate, "q1-a");
        gate.advance().unwrap();
        answer(&mut gate, "q2-a");
        answer(&mut gate, "q2-b");
        // 1/2 < 0.75
        assert_eq!(gate.advance().unwrap(), QuizPhase::Rejected);
    }

    #[test]
    fn duplicate_answer_ids_do_not_block_opinion_question() {
        let duplicated = QuizQuestion {
            prompt: "opinion".to_string(),
            answers: ["First", "Second"]
                .iter()
                .map(|text| QuizAnswer {
                    id: "x".to_string(),
                    text: text.to_string(),
                    correct: false,
                    explanation: None,
                })
                .collect(),
        };
        let mut gate = QuizGate::new(vec![duplicated], 0.0);

        answer(&mut gate, "x");
        assert!(gate.can_continue());
        assert_eq!(gate.advance().unwrap(), QuizPhase::Passed);
    }
}
