//! 标注流程控制器 - 流程层
//!
//! 核心职责：决定标注员当前在做哪个任务，并在状态之间转换
//!
//! ```text
//! Idle ─┬─> InQuiz ──(通过)──> AwaitingFirstTask ──> ShowingTask ──> Submitting ─┐
//!       │      └─(未通过)─> Terminated(RejectedByQuiz)     ^                     │
//!       └──────────────────> AwaitingFirstTask             └──── 下一个任务 ─────┤
//!                                                     Terminated(Completed) <────┘
//! ```
//!
//! 批量模式下唯一的位置信息是 进度表 + 游标，每次游标前进都会重新编码并写回会话 URL

use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::{AppError, AppResult, FetchError, SubmissionError, ValidationError};
use crate::infrastructure::{AnnotationBackend, SessionUrl};
use crate::models::{AnnotationRecord, AnnotationTask, MeshSource, Schedule};
use crate::services::{
    Geometry, GeometryBuilder, NextTask, QuizGate, QuizPhase, ScheduleCodec, SubmissionClient,
    TaskSource,
};
use crate::workflow::form::AnnotationForm;

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Completed,
    RejectedByQuiz,
}

/// 会话结束后的去向
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandOff {
    /// 跳转到外部平台
    Redirect(String),
    /// 展示感谢页面，延迟后结束
    ThankYou { delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub reason: TerminationReason,
    pub hand_off: HandOff,
}

/// 交给渲染端的网格
#[derive(Debug, Clone, PartialEq)]
pub enum MeshView {
    Geometry(Geometry),
    Asset { url: String },
}

/// 正在展示的任务
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTask {
    pub task: AnnotationTask,
    /// 首次展示的时间，用于计算耗时
    pub started_at: DateTime<Utc>,
    pub view: MeshView,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    InQuiz,
    AwaitingFirstTask,
    ShowingTask(ActiveTask),
    Submitting(AnnotationTask),
    Terminated(Termination),
}

impl Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::Idle => write!(f, "Idle"),
            WorkflowState::InQuiz => write!(f, "InQuiz"),
            WorkflowState::AwaitingFirstTask => write!(f, "AwaitingFirstTask"),
            WorkflowState::ShowingTask(active) => write!(f, "ShowingTask{}", active.task),
            WorkflowState::Submitting(task) => write!(f, "Submitting{}", task),
            WorkflowState::Terminated(t) => write!(f, "Terminated({:?})", t.reason),
        }
    }
}

/// 一次网格加载的凭证
///
/// 每次开始加载都会递增代数，结果返回时代数不一致说明已被新的加载取代
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    task: AnnotationTask,
}

impl LoadTicket {
    pub fn task(&self) -> &AnnotationTask {
        &self.task
    }
}

/// 一次提交的结果
///
/// 提交失败不阻止流程前进，两部分结果分开报告
#[derive(Debug)]
pub struct SubmitReport {
    pub submission: Result<(), SubmissionError>,
    pub advance: AppResult<()>,
}

/// 会话参数，会话开始时确定后只读
pub struct SessionOptions {
    pub reviewer_id: String,
    /// 需要先通过的测验；`None` 表示跳过
    pub quiz: Option<QuizGate>,
    pub completion_url_base: String,
    pub thank_you_delay: Duration,
}

pub struct WorkflowController<B> {
    backend: Arc<B>,
    source: TaskSource<B>,
    submitter: SubmissionClient<B>,
    location: SessionUrl,
    reviewer_id: String,
    oneshot: bool,
    quiz: Option<QuizGate>,
    completion_url_base: String,
    thank_you_delay: Duration,
    state: WorkflowState,
    /// 等待网格的任务；重试时复用
    pending: Option<AnnotationTask>,
    generation: u64,
    submitted: usize,
}

impl<B: AnnotationBackend> WorkflowController<B> {
    /// 创建控制器，并根据会话 URL 确定任务来源
    ///
    /// 无效的进度令牌按"没有进度表"处理，并从 URL 中移除
    pub fn new(backend: Arc<B>, mut location: SessionUrl, options: SessionOptions) -> Self {
        let schedule = match ScheduleCodec::decode_optional(location.schedule_token().as_deref()) {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!("⚠️ {}，忽略进度令牌", e);
                location.clear_schedule_token();
                None
            }
        };
        let schedule = schedule.or_else(|| location.direct_task().map(Schedule::single));

        let source = match schedule {
            Some(schedule) => {
                info!(
                    "📋 批量模式: 共 {} 个任务，从第 {} 个开始",
                    schedule.len(),
                    schedule.cursor() + 1
                );
                TaskSource::Batch(schedule)
            }
            None => {
                info!("🔄 交互模式: 逐个向后端获取任务");
                TaskSource::Interactive(backend.clone())
            }
        };

        let reviewer_id = location
            .platform_reviewer_id()
            .unwrap_or(options.reviewer_id);
        let oneshot = location.is_oneshot();

        Self {
            submitter: SubmissionClient::new(backend.clone()),
            backend,
            source,
            location,
            reviewer_id,
            oneshot,
            quiz: options.quiz,
            completion_url_base: options.completion_url_base,
            thank_you_delay: options.thank_you_delay,
            state: WorkflowState::Idle,
            pending: None,
            generation: 0,
            submitted: 0,
        }
    }

    // ========== 查询 ==========

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// 当前的会话位置（可直接收藏或分享）
    pub fn location(&self) -> &SessionUrl {
        &self.location
    }

    pub fn reviewer_id(&self) -> &str {
        &self.reviewer_id
    }

    pub fn is_oneshot(&self) -> bool {
        self.oneshot
    }

    pub fn is_batch(&self) -> bool {
        self.source.is_batch()
    }

    /// (当前序号, 总数)
    pub fn progress(&self) -> (usize, usize) {
        (self.source.current_index(), self.source.total_count())
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted
    }

    pub fn active_task(&self) -> Option<&ActiveTask> {
        match &self.state {
            WorkflowState::ShowingTask(active) => Some(active),
            _ => None,
        }
    }

    pub fn termination(&self) -> Option<&Termination> {
        match &self.state {
            WorkflowState::Terminated(t) => Some(t),
            _ => None,
        }
    }

    /// 只有展示任务时才能提交，提交进行中自动禁用
    pub fn can_submit(&self) -> bool {
        matches!(self.state, WorkflowState::ShowingTask(_))
    }

    /// 只有等待任务时才能重新获取
    pub fn can_fetch(&self) -> bool {
        matches!(self.state, WorkflowState::AwaitingFirstTask)
    }

    /// 测验进行中时可操作测验
    pub fn quiz_mut(&mut self) -> Option<&mut QuizGate> {
        match self.state {
            WorkflowState::InQuiz => self.quiz.as_mut(),
            _ => None,
        }
    }

    pub fn quiz_passed(&self) -> bool {
        matches!(self.quiz.as_ref().map(QuizGate::phase), Some(QuizPhase::Passed))
    }

    // ========== 状态转换 ==========

    fn set_state(&mut self, next: WorkflowState) {
        debug!("状态转换: {} -> {}", self.state, next);
        self.state = next;
    }

    /// 页面加载
    ///
    /// 有进度表时直接派生任务，不经过测验也不请求任务接口
    pub async fn start(&mut self) -> AppResult<()> {
        if self.state != WorkflowState::Idle {
            return Err(AppError::invalid_transition("start", &self.state));
        }

        if let Some(task) = self.source.current_task().cloned() {
            return self.load_task(task).await.map(|_| ());
        }

        let quiz_pending = self.quiz.as_ref().is_some_and(|q| !q.is_finished());
        if quiz_pending {
            info!("📝 进入测验");
            self.set_state(WorkflowState::InQuiz);
            return Ok(());
        }

        self.set_state(WorkflowState::AwaitingFirstTask);
        self.request_next().await
    }

    /// 测验结束后调用：通过则开始取任务，未通过则结束会话
    pub async fn finish_quiz(&mut self) -> AppResult<()> {
        if self.state != WorkflowState::InQuiz {
            return Err(AppError::invalid_transition("finish_quiz", &self.state));
        }
        let phase = self.quiz.as_ref().map(QuizGate::phase).unwrap_or(QuizPhase::Passed);
        match phase {
            QuizPhase::Passed => {
                self.set_state(WorkflowState::AwaitingFirstTask);
                self.request_next().await
            }
            QuizPhase::Rejected => {
                self.terminate(TerminationReason::RejectedByQuiz);
                Ok(())
            }
            other => Err(AppError::invalid_transition("finish_quiz", other)),
        }
    }

    /// 获取失败后重试
    ///
    /// 网格获取失败时重新加载同一个任务，否则向任务来源要下一个
    pub async fn retry(&mut self) -> AppResult<()> {
        if !self.can_fetch() {
            return Err(AppError::invalid_transition("retry", &self.state));
        }
        match self.pending.clone() {
            Some(task) => self.load_task(task).await.map(|_| ()),
            None => self.request_next().await,
        }
    }

    async fn request_next(&mut self) -> AppResult<()> {
        match self.source.next_task().await {
            Ok(NextTask::Task(task)) => {
                self.push_schedule();
                self.load_task(task).await.map(|_| ())
            }
            Ok(NextTask::Exhausted) => {
                info!("🏁 没有剩余任务");
                self.terminate(TerminationReason::Completed);
                Ok(())
            }
            Err(e) => {
                error!("❌ 获取任务失败: {}", e);
                self.pending = None;
                self.set_state(WorkflowState::AwaitingFirstTask);
                Err(e.into())
            }
        }
    }

    async fn load_task(&mut self, task: AnnotationTask) -> AppResult<bool> {
        let ticket = self.begin_load(task)?;
        let mesh = self.backend.fetch_mesh(ticket.task()).await;
        self.finish_load(ticket, mesh)
    }

    /// 开始为任务加载网格，之前未完成的加载随之作废
    pub fn begin_load(&mut self, task: AnnotationTask) -> AppResult<LoadTicket> {
        match self.state {
            WorkflowState::Idle | WorkflowState::AwaitingFirstTask | WorkflowState::Submitting(_) => {}
            _ => return Err(AppError::invalid_transition("load", &self.state)),
        }
        self.generation += 1;
        debug!("加载网格 {} (代数 {})", task, self.generation);
        self.pending = Some(task.clone());
        self.set_state(WorkflowState::AwaitingFirstTask);
        Ok(LoadTicket {
            generation: self.generation,
            task,
        })
    }

    /// 网格加载完成
    ///
    /// 过期的结果直接丢弃并返回 `Ok(false)`
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        mesh: Result<MeshSource, FetchError>,
    ) -> AppResult<bool> {
        if ticket.generation != self.generation || !self.can_fetch() {
            debug!("丢弃过期的网格结果 {} (代数 {})", ticket.task, ticket.generation);
            return Ok(false);
        }

        let view = match mesh {
            Ok(MeshSource::Raw(payload)) => match GeometryBuilder::build(&payload) {
                Ok(geometry) => MeshView::Geometry(geometry),
                Err(e) => {
                    // 同一任务重试没有意义，重试时改为取下一个任务
                    error!("❌ 网格数据不合法 {}: {}", ticket.task, e);
                    self.pending = None;
                    return Err(e.into());
                }
            },
            Ok(MeshSource::Asset { url }) => MeshView::Asset { url },
            Err(e) => {
                error!("❌ 获取网格失败 {}: {}", ticket.task, e);
                return Err(e.into());
            }
        };

        info!("🖼️ 展示任务 {}", ticket.task);
        self.pending = None;
        self.set_state(WorkflowState::ShowingTask(ActiveTask {
            task: ticket.task,
            started_at: Utc::now(),
            view,
        }));
        Ok(true)
    }

    /// 提交表单
    ///
    /// 校验失败时状态不变；提交失败会报告但流程照常前进
    pub async fn submit(&mut self, form: &AnnotationForm) -> AppResult<SubmitReport> {
        if !self.can_submit() {
            return Err(AppError::invalid_transition("submit", &self.state));
        }
        let (task, description) = form.validate()?;
        if let WorkflowState::ShowingTask(active) = &self.state {
            if active.task != task {
                return Err(ValidationError::TaskMismatch {
                    shown: active.task.to_string(),
                    submitted: task.to_string(),
                }
                .into());
            }
        }

        let previous = std::mem::replace(&mut self.state, WorkflowState::Submitting(task.clone()));
        let WorkflowState::ShowingTask(active) = previous else {
            return Err(AppError::invalid_transition("submit", &self.state));
        };
        debug!("状态转换: ShowingTask{} -> Submitting{}", active.task, task);

        let elapsed = Utc::now().signed_duration_since(active.started_at);
        let record = AnnotationRecord {
            task,
            description,
            is_mesh_malformed: form.is_mesh_malformed,
            is_grasp_invalid: form.is_grasp_invalid,
            user_id: self.reviewer_id.clone(),
            time_taken: elapsed.num_milliseconds().max(0) as f64 / 1000.0,
        };

        let submission = self.submitter.submit(&record).await;
        self.submitted += 1;

        let advance = self.advance().await;
        Ok(SubmitReport { submission, advance })
    }

    async fn advance(&mut self) -> AppResult<()> {
        if self.oneshot {
            info!("🏁 一次性会话，提交后结束");
            self.terminate(TerminationReason::Completed);
            return Ok(());
        }
        self.request_next().await
    }

    /// 把当前进度表写回会话 URL
    fn push_schedule(&mut self) {
        if let Some(schedule) = self.source.schedule() {
            let token = ScheduleCodec::encode(schedule);
            self.location.set_schedule_token(&token);
            debug!(
                "写回进度令牌: 游标 {}/{}",
                schedule.cursor() + 1,
                schedule.len()
            );
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        if self.source.is_batch() && reason == TerminationReason::Completed {
            // 已完成的进度表不再可恢复，避免重新展示已提交的任务
            self.location.clear_schedule_token();
        }

        let code = match reason {
            TerminationReason::Completed => self.location.prolific_code(),
            TerminationReason::RejectedByQuiz => self.location.prolific_rejection_code(),
        };
        let hand_off = match code {
            Some(code) => HandOff::Redirect(completion_redirect(&self.completion_url_base, &code)),
            None => HandOff::ThankYou {
                delay: self.thank_you_delay,
            },
        };

        info!("会话结束: {:?} -> {:?}", reason, hand_off);
        self.pending = None;
        self.set_state(WorkflowState::Terminated(Termination { reason, hand_off }));
    }
}

fn completion_redirect(base: &str, code: &str) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("cc", code);
            url.into()
        }
        Err(_) => format!("{}?cc={}", base, code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_appends_completion_code() {
        assert_eq!(
            completion_redirect("https://app.prolific.com/submissions/complete", "C0DE"),
            "https://app.prolific.com/submissions/complete?cc=C0DE"
        );
    }
}
