use futures::StreamExt;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tracing::warn;

use super::service::GeminiService;
use super::types::{Content, GenerateContentRequest, GenerateContentResponse};

impl GeminiService {
    /// Streams a natural-language answer synthesized from the accumulated
    /// per-tool context strings. Chunks arrive in generation order; the
    /// channel closes when the collaborator finishes or fails (failures are
    /// logged, and the caller falls back to chunking the raw context).
    pub async fn commentary_stream(
        &self,
        question: &str,
        contexts: &[String],
    ) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(100);
        let client = self.client.clone();
        let api_key = self.api_key.expose_secret().clone();
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );

        let bullets = contexts
            .iter()
            .map(|context| format!("- {context}"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "The user asked: {question}\n\nTool results:\n{bullets}\n\n\
             Using only the tool results above, answer the user in a short, \
             conversational paragraph."
        );

        tokio::spawn(async move {
            let request = GenerateContentRequest {
                contents: vec![Content::user(prompt)],
                tools: Vec::new(),
            };

            let response = client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let mut stream = response.bytes_stream();
                    let mut buffer = String::new();

                    while let Some(chunk) = stream.next().await {
                        match chunk {
                            Ok(chunk) => {
                                buffer.push_str(&String::from_utf8_lossy(&chunk));

                                // Process complete SSE lines.
                                while let Some(pos) = buffer.find('\n') {
                                    let line = buffer[..pos].trim().to_string();
                                    buffer = buffer[pos + 1..].to_string();

                                    let Some(data) = line.strip_prefix("data: ") else {
                                        continue;
                                    };
                                    if let Ok(parsed) =
                                        serde_json::from_str::<GenerateContentResponse>(data)
                                    {
                                        for candidate in parsed.candidates {
                                            let Some(content) = candidate.content else {
                                                continue;
                                            };
                                            for part in content.parts {
                                                if let Some(text) = part.text {
                                                    if tx.send(text).await.is_err() {
                                                        return;
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "commentary stream failed");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "commentary request failed");
                }
            }
        });

        rx
    }
}
