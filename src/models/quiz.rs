//! 测验题目模型

use serde::{Deserialize, Serialize};

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub correct: bool,
    /// 提交后展示的解释
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// 单选题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub answers: Vec<QuizAnswer>,
}

impl QuizQuestion {
    /// 标记为正确的选项；没有正确选项的题目只用于收集意见，不计分
    pub fn correct_answer(&self) -> Option<&QuizAnswer> {
        self.answers.iter().find(|a| a.correct)
    }

    pub fn answer(&self, id: &str) -> Option<&QuizAnswer> {
        self.answers.iter().find(|a| a.id == id)
    }
}

/// 测验文件（TOML）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizFile {
    pub questions: Vec<QuizQuestion>,
}

fn answer(id: &str, text: &str, correct: bool, explanation: &str) -> QuizAnswer {
    QuizAnswer {
        id: id.to_string(),
        text: text.to_string(),
        correct,
        explanation: Some(explanation.to_string()),
    }
}

/// 内置的抓取描述校准测验
pub fn default_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            prompt: "Which of these is a good grasp description?".to_string(),
            answers: vec![
                answer(
                    "q1-a",
                    "The mug is being held from the inside of the rim as opposed to the handle.",
                    false,
                    "This compares the grasp to an alternative grasp.",
                ),
                answer(
                    "q1-b",
                    "The grasp is placed on the side of the mug where it connects to the body and is parallel with the body, placed in the middle vertically.",
                    true,
                    "It says where the grasp is and how it is oriented, without judging it.",
                ),
                answer(
                    "q1-c",
                    "The grasp is off and bad positioning, the cup will fall.",
                    false,
                    "This judges the quality of the grasp.",
                ),
            ],
        },
        QuizQuestion {
            prompt: "What should a grasp description avoid?".to_string(),
            answers: vec![
                answer(
                    "q2-a",
                    "Where on the object the grasp is placed.",
                    false,
                    "Placement is exactly what the description must contain.",
                ),
                answer(
                    "q2-b",
                    "How the gripper is oriented relative to the object.",
                    false,
                    "Orientation is required.",
                ),
                answer(
                    "q2-c",
                    "Guessing what the grasp was intended for.",
                    true,
                    "Descriptions stay factual and never speculate about intent.",
                ),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_questions_have_one_correct_answer_each() {
        for question in default_questions() {
            assert_eq!(question.answers.iter().filter(|a| a.correct).count(), 1);
        }
    }
}
