//! W3C WebDriver client

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::WebDriverConfig;
use crate::driver::{Driver, ElementHandle, Selector};
use crate::error::{HarnessError, HarnessResult};

/// Key under which W3C remote ends return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// One WebDriver session
pub struct WebDriverClient {
    client: reqwest::Client,
    session_url: String,
}

impl WebDriverClient {
    /// Open a new session on the remote end
    pub async fn connect(config: &WebDriverConfig) -> HarnessResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        let base = config.url.trim_end_matches('/').to_string();

        info!("Opening {} session at {}", config.browser, base);
        let resp = client
            .post(format!("{base}/session"))
            .json(&capabilities(config))
            .send()
            .await?;
        let value = parse_response(resp.json().await?)?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| HarnessError::Driver {
                code: "session not created".to_string(),
                message: format!("no sessionId in response: {value}"),
            })?;

        debug!("WebDriver session {}", session_id);
        Ok(Self {
            client,
            session_url: format!("{base}/session/{session_id}"),
        })
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> HarnessResult<Value> {
        let url = format!("{}{}", self.session_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if method == Method::POST {
            request = request.json(&body.unwrap_or_else(|| json!({})));
        }
        let resp = request.send().await?;
        parse_response(resp.json().await?)
    }

    fn element_path(element: &ElementHandle, suffix: &str) -> String {
        format!("/element/{}{}", element.0, suffix)
    }
}

fn capabilities(config: &WebDriverConfig) -> Value {
    let size = format!("--window-size={},{}", config.window_width, config.window_height);
    let mut args = vec![size];
    if config.headless {
        args.push("--headless".to_string());
    }

    let mut always_match = json!({ "browserName": config.browser });
    match config.browser.as_str() {
        "firefox" => {
            always_match["moz:firefoxOptions"] = json!({ "args": args });
        }
        _ => {
            always_match["goog:chromeOptions"] = json!({ "args": args });
        }
    }
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

/// Unwrap the `value` member, turning W3C error payloads into errors
fn parse_response(body: Value) -> HarnessResult<Value> {
    let value = body.get("value").cloned().unwrap_or(Value::Null);
    if let Some(code) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(HarnessError::Driver {
            code: code.to_string(),
            message,
        });
    }
    Ok(value)
}

fn element_handles(value: &Value) -> Vec<ElementHandle> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
                .map(|id| ElementHandle(id.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Driver for WebDriverClient {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        debug!("navigate {}", url);
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn refresh(&self) -> HarnessResult<()> {
        self.command(Method::POST, "/refresh", None).await?;
        Ok(())
    }

    async fn find_elements(&self, selector: &Selector) -> HarnessResult<Vec<ElementHandle>> {
        let body = json!({ "using": "css selector", "value": selector.to_css() });
        let value = self.command(Method::POST, "/elements", Some(body)).await?;
        Ok(element_handles(&value))
    }

    async fn click(&self, element: &ElementHandle) -> HarnessResult<()> {
        self.command(Method::POST, &Self::element_path(element, "/click"), None)
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> HarnessResult<()> {
        self.command(Method::POST, &Self::element_path(element, "/clear"), None)
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> HarnessResult<()> {
        self.command(
            Method::POST,
            &Self::element_path(element, "/value"),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> HarnessResult<String> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/text"), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> HarnessResult<Option<String>> {
        let path = Self::element_path(element, &format!("/attribute/{name}"));
        let value = self.command(Method::GET, &path, None).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> HarnessResult<bool> {
        let value = self
            .command(Method::GET, &Self::element_path(element, "/displayed"), None)
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn quit(&self) -> HarnessResult<()> {
        info!("Closing WebDriver session");
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrome_capabilities() {
        let caps = capabilities(&WebDriverConfig::default());
        let always = &caps["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        let args = always["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.contains(&json!("--headless")));
        assert!(args.contains(&json!("--window-size=1600,1000")));
    }

    #[test]
    fn test_firefox_capabilities() {
        let config = WebDriverConfig {
            browser: "firefox".into(),
            headless: false,
            ..Default::default()
        };
        let caps = capabilities(&config);
        let args = &caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"];
        assert_eq!(args.as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_error_payload_becomes_driver_error() {
        let body = json!({
            "value": { "error": "no such element", "message": "Unable to locate", "stacktrace": "" }
        });
        let err = parse_response(body).unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, HarnessError::Driver { ref code, .. } if code == "no such element"));
    }

    #[test]
    fn test_element_handles_are_extracted() {
        let value = json!([
            { ELEMENT_KEY: "a1" },
            { ELEMENT_KEY: "b2" },
            { "unexpected": "c3" }
        ]);
        let handles = element_handles(&value);
        assert_eq!(
            handles,
            vec![ElementHandle("a1".into()), ElementHandle("b2".into())]
        );
    }
}
