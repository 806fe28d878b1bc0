//! 终端标注会话 - 编排层
//!
//! 渲染交给外部查看器，这里只展示任务信息、收集表单并驱动流程控制器

use crate::config::Config;
use crate::error::AppError;
use crate::infrastructure::{HttpBackend, LocalStore, SessionUrl};
use crate::models::quiz::default_questions;
use crate::models::load_quiz_file;
use crate::services::{QuizGate, QuizPhase};
use crate::utils::logging::{log_startup, print_session_summary, truncate_text};
use crate::workflow::{
    ActiveTask, AnnotationForm, HandOff, MeshView, SessionOptions, SubmitReport,
    TerminationReason, WorkflowController, WorkflowState,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info, warn};

/// 标准输入上的逐行提问
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// 读取一行；输入结束时返回 `None`
    async fn ask(&mut self, question: &str) -> Result<Option<String>> {
        println!("{}", question);
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }

    async fn confirm(&mut self, question: &str, default: bool) -> Result<Option<bool>> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let Some(answer) = self.ask(&format!("{} {}", question, hint)).await? else {
            return Ok(None);
        };
        Ok(Some(match answer.to_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        }))
    }
}

/// 会话统计
#[derive(Debug, Default)]
struct SessionStats {
    submitted: usize,
    failed: usize,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: LocalStore,
    location: SessionUrl,
    force_quiz: bool,
}

impl App {
    /// 初始化应用
    ///
    /// 会话地址优先级：命令行 > 上次保存的地址 > 配置中的起始页
    pub async fn initialize(config: Config, url: Option<String>, force_quiz: bool) -> Result<Self> {
        config.validate()?;
        let store = LocalStore::load_or_init(&config.state_file)?;

        let raw_url = url
            .or_else(|| store.resume_url().map(str::to_string))
            .unwrap_or_else(|| config.app_base_url.clone());
        let location = SessionUrl::parse(&raw_url)?;

        Ok(Self {
            config,
            store,
            location,
            force_quiz,
        })
    }

    async fn build_quiz(&self) -> Result<Option<QuizGate>> {
        if self.store.quiz_seen() && !self.force_quiz {
            return Ok(None);
        }
        let questions = match &self.config.quiz_file {
            Some(path) => load_quiz_file(path).await?,
            None => default_questions(),
        };
        Ok(Some(QuizGate::new(questions, self.config.pass_threshold)))
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        let reviewer_id = self
            .location
            .platform_reviewer_id()
            .unwrap_or_else(|| self.store.reviewer_id().to_string());
        log_startup(&reviewer_id, self.location.as_str());

        let backend = Arc::new(HttpBackend::new(&self.config.api_base_url, &reviewer_id));
        let options = SessionOptions {
            reviewer_id,
            quiz: self.build_quiz().await?,
            completion_url_base: self.config.completion_url_base.clone(),
            thank_you_delay: self.config.thank_you_delay(),
        };
        let mut controller = WorkflowController::new(backend, self.location.clone(), options);
        let mut prompt = Prompt::stdin();
        let mut stats = SessionStats::default();

        report_error(controller.start().await);

        loop {
            self.remember(&controller)?;

            match controller.state().clone() {
                WorkflowState::InQuiz => {
                    if !run_quiz(&mut controller, &mut prompt).await? {
                        break;
                    }
                    report_error(controller.finish_quiz().await);
                    if controller.quiz_passed() {
                        self.store.mark_quiz_seen()?;
                    }
                }
                WorkflowState::AwaitingFirstTask => {
                    match prompt.confirm("获取任务失败，是否重试？", true).await? {
                        Some(true) => report_error(controller.retry().await),
                        _ => break,
                    }
                }
                WorkflowState::ShowingTask(active) => {
                    show_task(&active, controller.progress(), controller.is_batch());
                    let Some(form) = collect_form(&active, &mut prompt).await? else {
                        break;
                    };
                    match controller.submit(&form).await {
                        Ok(report) => handle_report(report, &mut stats),
                        Err(AppError::Validation(e)) => println!("⚠️ {}", e),
                        Err(e) => error!("❌ {}", e),
                    }
                }
                WorkflowState::Terminated(termination) => {
                    self.store.set_resume_url(None)?;
                    match termination.reason {
                        TerminationReason::Completed => println!("🎉 全部完成，感谢参与！"),
                        TerminationReason::RejectedByQuiz => println!("很遗憾，测验未通过。感谢参与！"),
                    }
                    match termination.hand_off {
                        HandOff::Redirect(url) => println!("请前往: {}", url),
                        HandOff::ThankYou { delay } => tokio::time::sleep(delay).await,
                    }
                    break;
                }
                WorkflowState::Idle | WorkflowState::Submitting(_) => {
                    warn!("⚠️ 意外的状态: {}", controller.state());
                    break;
                }
            }
        }

        print_session_summary(stats.submitted, stats.failed);
        Ok(())
    }

    /// 记录当前会话地址，下次启动从这里恢复
    fn remember(&mut self, controller: &WorkflowController<HttpBackend>) -> Result<()> {
        if controller.termination().is_none() {
            self.store.set_resume_url(Some(controller.location().as_str()))?;
        }
        Ok(())
    }
}

fn report_error(result: crate::error::AppResult<()>) {
    if let Err(e) = result {
        error!("❌ {}", e);
    }
}

fn handle_report(report: SubmitReport, stats: &mut SessionStats) {
    stats.submitted += 1;
    if let Err(e) = report.submission {
        stats.failed += 1;
        // 提交失败只提示，不阻止继续标注
        println!(
            "⚠️ 提交失败 (状态码 {}): {}",
            e.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            truncate_text(&e.body, 200)
        );
    }
    report_error(report.advance);
}

/// 逐题作答；输入结束时返回 false
async fn run_quiz(
    controller: &mut WorkflowController<HttpBackend>,
    prompt: &mut Prompt,
) -> Result<bool> {
    let Some(quiz) = controller.quiz_mut() else {
        return Ok(true);
    };
    println!("在开始标注之前，请完成一个简短的测验。");

    while !quiz.is_finished() {
        let Some(question) = quiz.current_question().cloned() else {
            break;
        };
        println!(
            "\n第 {}/{} 题: {}",
            quiz.state().question_index + 1,
            quiz.question_count(),
            question.prompt
        );
        for (i, answer) in question.answers.iter().enumerate() {
            println!("  {}. {}", i + 1, answer.text);
        }

        let Some(input) = prompt.ask("请输入选项编号:").await? else {
            return Ok(false);
        };
        let Some(answer) = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.answers.get(i))
        else {
            println!("⚠️ 无效的选项");
            continue;
        };

        quiz.select(&answer.id)?;
        let feedback = quiz.submit()?;
        let verdict = if feedback.answer.correct { "✅ 正确" } else { "❌ 不正确" };
        println!("{}", verdict);
        if let Some(explanation) = &feedback.answer.explanation {
            println!("   {}", explanation);
        }

        if quiz.can_continue() {
            let phase = quiz.advance()?;
            info!("测验状态: {}", phase);
            if phase == QuizPhase::Passed || phase == QuizPhase::Rejected {
                break;
            }
        } else {
            println!("请再试一次。");
        }
    }
    Ok(true)
}

fn show_task(active: &ActiveTask, (index, total): (usize, usize), batch: bool) {
    println!("\n{}", "─".repeat(60));
    if batch {
        println!("任务 {}/{}", index + 1, total);
    }
    println!(
        "类别: {}  物体: {}  抓取: {}",
        active.task.object_category, active.task.object_id, active.task.grasp_id
    );
    match &active.view {
        MeshView::Geometry(geometry) => println!(
            "网格: {} 个顶点, {} 个三角形{}",
            geometry.vertex_count(),
            geometry.triangle_count(),
            if geometry.colors.is_some() { ", 带顶点颜色" } else { "" }
        ),
        MeshView::Asset { url } => println!("网格资源: {}", url),
    }
    println!("{}", "─".repeat(60));
}

/// 收集表单；输入结束时返回 `None`
async fn collect_form(active: &ActiveTask, prompt: &mut Prompt) -> Result<Option<AnnotationForm>> {
    let Some(description) = prompt.ask("请描述抓取的位置和朝向:").await? else {
        return Ok(None);
    };
    let Some(malformed) = prompt.confirm("网格是否损坏？", false).await? else {
        return Ok(None);
    };
    let Some(invalid) = prompt.confirm("抓取是否无效？", false).await? else {
        return Ok(None);
    };

    Ok(Some(
        AnnotationForm::for_task(&active.task)
            .with_description(description)
            .with_flags(malformed, invalid),
    ))
}
