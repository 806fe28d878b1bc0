//! HTTP 后端 - 基础设施层
//!
//! 持有唯一的 HTTP 客户端，只暴露三个接口调用能力

use crate::error::{FetchError, SubmissionError};
use crate::infrastructure::backend::AnnotationBackend;
use crate::models::{AnnotationRecord, AnnotationTask, MeshPayload, MeshSource};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::{form_urlencoded, Url};

const NEXT_TASK_ENDPOINT: &str = "api/get-object-info";
const MESH_ENDPOINT: &str = "api/get-mesh-data";
const SUBMIT_ENDPOINT: &str = "api/submit-annotation";

/// HTTP 后端
///
/// 职责：
/// - 持有 reqwest Client
/// - 把状态码映射为 FetchError / SubmissionError
/// - 不认识流程状态
pub struct HttpBackend {
    client: Client,
    base_url: String,
    user_id: String,
}

impl HttpBackend {
    /// 创建新的 HTTP 后端
    ///
    /// `user_id` 同时以 cookie 形式发送
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 网格接口地址
    ///
    /// 类别和物体ID按路径段编码，其中的 `/`、`?`、`#` 不会改变请求的资源
    pub fn mesh_url(&self, task: &AnnotationTask) -> Result<String, FetchError> {
        let endpoint = self.endpoint(MESH_ENDPOINT);
        let mut url =
            Url::parse(&endpoint).map_err(|e| FetchError::new(&endpoint, None, e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| FetchError::new(&endpoint, None, "后端地址不能作为路径前缀"))?
            .push(&task.object_category)
            .push(&task.object_id)
            .push(&task.grasp_id.to_string());
        Ok(url.into())
    }

    /// 只携带 `user_id` 一项，值经过转义
    fn cookie(&self) -> String {
        let value: String = form_urlencoded::byte_serialize(self.user_id.as_bytes()).collect();
        format!("user_id={}", value)
    }
}

#[async_trait]
impl AnnotationBackend for HttpBackend {
    async fn fetch_next_task(&self) -> Result<Option<AnnotationTask>, FetchError> {
        let url = self.endpoint(NEXT_TASK_ENDPOINT);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(COOKIE, self.cookie())
            .send()
            .await
            .map_err(|e| FetchError::new(&url, None, e.to_string()))?;

        let status = response.status();
        debug!("{} -> {}", url, status);

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ 获取任务失败: {} {}", status, body);
            return Err(FetchError::new(&url, Some(status.as_u16()), body));
        }

        response
            .json::<AnnotationTask>()
            .await
            .map(Some)
            .map_err(|e| FetchError::new(&url, Some(status.as_u16()), format!("无法解析任务: {}", e)))
    }

    async fn fetch_mesh(&self, task: &AnnotationTask) -> Result<MeshSource, FetchError> {
        let url = self.mesh_url(task)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(COOKIE, self.cookie())
            .send()
            .await
            .map_err(|e| FetchError::new(&url, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ 获取网格失败: {} {}", status, body);
            return Err(FetchError::new(&url, Some(status.as_u16()), body));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("application/json"))
            .unwrap_or(false);

        if !is_json {
            // 二进制资源由渲染端自行加载
            return Ok(MeshSource::Asset { url });
        }

        response
            .json::<MeshPayload>()
            .await
            .map(MeshSource::Raw)
            .map_err(|e| FetchError::new(&url, Some(status.as_u16()), format!("无法解析网格: {}", e)))
    }

    async fn submit_annotation(&self, record: &AnnotationRecord) -> Result<(), SubmissionError> {
        let url = self.endpoint(SUBMIT_ENDPOINT);
        debug!("POST {} {}", url, record.task);

        let response = self
            .client
            .post(&url)
            .header(COOKIE, self.cookie())
            .json(record)
            .send()
            .await
            .map_err(|e| SubmissionError::new(None, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SubmissionError::new(Some(status.as_u16()), body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// 本地单次应答服务器，返回后端地址和收到的原始请求
    async fn serve_once(
        status: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (String, JoinHandle<String>) {
        let content_type = content_type
            .map(|value| format!("Content-Type: {}\r\n", value))
            .unwrap_or_default();
        let response = format!(
            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn record() -> AnnotationRecord {
        AnnotationRecord {
            task: AnnotationTask::new("Mug", "abc", 3),
            description: "The grasp is on the handle.".to_string(),
            is_mesh_malformed: false,
            is_grasp_invalid: false,
            user_id: "u1".to_string(),
            time_taken: 1.5,
        }
    }

    #[test]
    fn builds_endpoint_urls_without_double_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", "u1");
        assert_eq!(
            backend.endpoint(NEXT_TASK_ENDPOINT),
            "http://localhost:8000/api/get-object-info"
        );
        assert_eq!(
            backend.mesh_url(&AnnotationTask::new("Mug", "abc", 3)).unwrap(),
            "http://localhost:8000/api/get-mesh-data/Mug/abc/3"
        );
        assert_eq!(backend.cookie(), "user_id=u1");
    }

    #[test]
    fn mesh_url_escapes_reserved_characters() {
        let backend = HttpBackend::new("http://localhost:8000", "u1");
        let url = backend
            .mesh_url(&AnnotationTask::new("Mug", "a/b?c#d", 1))
            .unwrap();
        assert_eq!(url, "http://localhost:8000/api/get-mesh-data/Mug/a%2Fb%3Fc%23d/1");
    }

    #[test]
    fn cookie_value_cannot_add_pairs() {
        let backend = HttpBackend::new("http://localhost:8000", "p1; admin=1");
        let cookie = backend.cookie();
        assert!(!cookie.contains(';'));
        assert_eq!(cookie.matches('=').count(), 1);
    }

    #[tokio::test]
    async fn no_content_means_exhausted() {
        let (base, server) = serve_once("204 No Content", None, "").await;
        let backend = HttpBackend::new(base, "u1");

        assert_eq!(backend.fetch_next_task().await.unwrap(), None);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/get-object-info"));
        assert!(request.to_lowercase().contains("cookie: user_id=u1"));
    }

    #[tokio::test]
    async fn next_task_is_parsed_from_json() {
        let (base, server) = serve_once(
            "200 OK",
            Some("application/json"),
            r#"{"object_category":"Mug","object_id":"abc","grasp_id":3}"#,
        )
        .await;
        let backend = HttpBackend::new(base, "u1");

        let task = backend.fetch_next_task().await.unwrap();
        assert_eq!(task, Some(AnnotationTask::new("Mug", "abc", 3)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unavailable_backend_is_fetch_error() {
        let (base, server) = serve_once("503 Service Unavailable", None, "busy").await;
        let backend = HttpBackend::new(base, "u1");

        let err = backend.fetch_next_task().await.unwrap_err();
        assert_eq!(err.status, Some(503));
        assert_eq!(err.message, "busy");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn json_mesh_is_raw_payload() {
        let (base, server) = serve_once(
            "200 OK",
            Some("application/json"),
            r#"{"vertices":[0,0,0,1,0,0,0,1,0],"faces":[0,1,2]}"#,
        )
        .await;
        let backend = HttpBackend::new(base, "u1");

        match backend.fetch_mesh(&AnnotationTask::new("Mug", "abc", 3)).await.unwrap() {
            MeshSource::Raw(payload) => {
                assert_eq!(payload.vertices.len(), 9);
                assert_eq!(payload.faces, vec![0, 1, 2]);
            }
            other => panic!("unexpected mesh source: {:?}", other),
        }
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/get-mesh-data/Mug/abc/3 "));
    }

    #[tokio::test]
    async fn binary_mesh_is_asset_url() {
        let (base, server) = serve_once("200 OK", Some("model/gltf-binary"), "glTF").await;
        let backend = HttpBackend::new(base.clone(), "u1");

        let source = backend.fetch_mesh(&AnnotationTask::new("Mug", "abc", 3)).await.unwrap();
        assert_eq!(
            source,
            MeshSource::Asset {
                url: format!("{}/api/get-mesh-data/Mug/abc/3", base)
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejected_submission_keeps_status_and_body() {
        let (base, server) =
            serve_once("500 Internal Server Error", None, "database unavailable").await;
        let backend = HttpBackend::new(base, "u1");

        let err = backend.submit_annotation(&record()).await.unwrap_err();
        assert_eq!(err.status, Some(500));
        assert_eq!(err.body, "database unavailable");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/submit-annotation"));
        assert!(request.contains("\"object_category\":\"Mug\""));
    }
}
