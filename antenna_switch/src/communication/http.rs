use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use ticcmd::Status;
use tracing::{debug, error, warn};

use crate::{
    command_executor::switchboard::{
        command_sender::{SwitchboardCommandSender, SwitchboardError},
        commands::SwitchResult,
    },
    models::PortOption,
};

#[derive(Clone)]
pub struct AppState {
    switchboard: SwitchboardCommandSender,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Switchboard(#[from] SwitchboardError),

    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Switchboard(SwitchboardError::Device(err)) => {
                warn!(error = %err, "device request failed");
                (StatusCode::BAD_GATEWAY, err.to_string()).into_response()
            }
            err => {
                error!(error = %err, "serving 500");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    ports: Vec<PortOption>,
    messages: Vec<String>,
}

pub fn router(switchboard: SwitchboardCommandSender) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/switch", get(switch_port))
        .route("/calibrate", get(calibrate))
        .route("/status", get(status))
        .with_state(AppState { switchboard })
}

fn back_to_panel() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let panel = state.switchboard.panel().await?;
    let page = IndexTemplate {
        ports: panel.ports,
        messages: panel.messages,
    }
    .render()?;

    Ok(Html(page))
}

async fn switch_port(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let port = params
        .into_iter()
        .find_map(|(key, value)| (key == "port").then_some(value));

    if let Some(label) = port {
        if state.switchboard.switch_to(label.clone()).await? == SwitchResult::Ignored {
            debug!(label = %label, "switch request for unknown port");
        }
    }

    Ok(back_to_panel())
}

async fn calibrate(State(state): State<AppState>) -> Result<Response, AppError> {
    let errors = state.switchboard.calibrate().await?;
    debug!(errors = errors.len(), "calibration request finished");

    Ok(back_to_panel())
}

async fn status(State(state): State<AppState>) -> Result<Json<Status>, AppError> {
    Ok(Json(state.switchboard.status().await?))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use ticcmd::{MockTic, TicClient};
    use tower::ServiceExt as _;
    use utilities::command_executor::CommandExecutor;

    use super::*;
    use crate::{
        command_executor::switchboard::SwitchboardHandler,
        controllers::switchboard::{Switchboard, port_map::PortMap},
        models::Port,
    };

    fn app(mock: &MockTic) -> Router {
        let ports = PortMap::new(vec![
            Port::new("40m", 32),
            Port::new("20m", 16),
            Port::new("Ground", 0),
        ])
        .unwrap();
        let switchboard = Switchboard::new(TicClient::with_runner(mock.clone()), ports)
            .unwrap()
            .with_move_timeout(Duration::from_millis(200));

        let executor = CommandExecutor::new(SwitchboardHandler::new(switchboard));
        let sender = SwitchboardCommandSender::new(executor.sender());
        executor.spawn();
        router(sender)
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_redirects_home(response: &Response) {
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn index_lists_ports_and_marks_selection() {
        let mock = MockTic::new(1);
        let app = app(&mock);

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_text(response).await;
        assert!(page.contains("40m"));
        assert!(page.contains("20m"));
        assert!(page.contains("class='selected' disabled>Ground<"));
        assert!(page.contains("action='/calibrate'"));
        assert!(page.contains("http-equiv=\"refresh\" content=\"5\""));
    }

    #[tokio::test]
    async fn switch_moves_and_redirects() {
        let mock = MockTic::new(1);
        let app = app(&mock);

        let response = get(&app, "/switch?port=20m").await;
        assert_redirects_home(&response);
        assert_eq!(mock.current_position(), 16);
        assert!(!mock.is_energized());

        let page = body_text(get(&app, "/").await).await;
        assert!(page.contains("class='selected' disabled>20m<"));
        assert!(page.contains("switching to 20m"));
    }

    #[tokio::test]
    async fn switch_without_port_is_a_redirect() {
        let mock = MockTic::new(1);
        let app = app(&mock);
        mock.clear_invocations();

        assert_redirects_home(&get(&app, "/switch").await);
        assert_redirects_home(&get(&app, "/switch?port=70cm").await);
        assert!(mock.invocations().is_empty());
    }

    #[tokio::test]
    async fn repeated_port_uses_first_value() {
        let mock = MockTic::new(1);
        let app = app(&mock);

        let response = get(&app, "/switch?port=40m&port=Ground").await;
        assert_redirects_home(&response);
        assert_eq!(mock.current_position(), 32);
    }

    #[tokio::test]
    async fn calibrate_redirects() {
        let mock = MockTic::new(1);
        let app = app(&mock);

        assert_redirects_home(&get(&app, "/calibrate").await);
        assert!(mock.was_invoked("--halt-and-set-position"));
        assert_eq!(mock.current_position(), 32);
    }

    #[tokio::test]
    async fn status_is_served_as_json() {
        let mock = MockTic::new(16);
        let app = app(&mock);

        let response = get(&app, "/status").await;
        assert_eq!(response.status(), StatusCode::OK);

        let status: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(status["current_position"], 16);
        assert_eq!(status["energized"], false);
    }

    #[tokio::test]
    async fn status_failure_is_bad_gateway() {
        let mock = MockTic::new(16);
        let app = app(&mock);
        mock.fail_on("--status");

        let response = get(&app, "/status").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(body_text(response).await.contains("error retrieving status"));
    }
}
