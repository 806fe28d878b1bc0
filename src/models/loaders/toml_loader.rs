use crate::models::quiz::{QuizFile, QuizQuestion};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tokio::fs;

/// 任务骨架：类别 → 物体ID → 抓取ID列表
pub type TaskSkeleton = BTreeMap<String, BTreeMap<String, Vec<u64>>>;

/// 从 TOML 文件加载测验题目
pub async fn load_quiz_file(path: &Path) -> Result<Vec<QuizQuestion>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取测验文件: {}", path.display()))?;

    let quiz: QuizFile = toml::from_str(&content)
        .with_context(|| format!("无法解析测验文件: {}", path.display()))?;

    for (index, question) in quiz.questions.iter().enumerate() {
        if question.answers.is_empty() {
            anyhow::bail!("测验第 {} 题没有选项", index + 1);
        }
        if question.answers.iter().filter(|a| a.correct).count() > 1 {
            anyhow::bail!("测验第 {} 题有多个正确选项", index + 1);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = question.answers.iter().find(|a| !seen.insert(a.id.as_str())) {
            anyhow::bail!("测验第 {} 题的选项ID重复: {}", index + 1, dup.id);
        }
    }

    tracing::info!("成功加载 {} 道测验题", quiz.questions.len());
    Ok(quiz.questions)
}

/// 从 TOML 文件加载任务骨架
pub async fn load_skeleton_file(path: &Path) -> Result<TaskSkeleton> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取任务骨架文件: {}", path.display()))?;

    let skeleton: TaskSkeleton = toml::from_str(&content)
        .with_context(|| format!("无法解析任务骨架文件: {}", path.display()))?;

    let total: usize = skeleton
        .values()
        .flat_map(|objects| objects.values())
        .map(Vec::len)
        .sum();
    tracing::info!("成功加载 {} 个类别, 共 {} 个抓取", skeleton.len(), total);

    Ok(skeleton)
}
