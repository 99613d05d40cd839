//! OpenAI-compatible chat-completions client

use super::{parse_generated_questions, questions_schema, user_prompt, QuestionGenerator};
use super::{GENERATE_QUESTIONS_TOOL, SYSTEM_PROMPT};
use crate::database::GeneratedQuestion;
use crate::error::{AppError, Result};
use async_openai::config::{Config, OpenAIConfig};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionToolArgs, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionResponse, FunctionName, FunctionObjectArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::error::Error;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(base_url: &str, api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let config = OpenAIConfig::default()
            .with_api_base(base_url.trim_end_matches('/'))
            .with_api_key(api_key);

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        // Failed calls surface immediately, never retried
        let mut backoff_builder = ExponentialBackoffBuilder::default();
        backoff_builder.with_max_elapsed_time(Some(Duration::ZERO));

        let client = Client::with_config(config)
            .with_http_client(http_client)
            .with_backoff(backoff_builder.build());

        Ok(Self { client, model })
    }

    fn request(&self, text: &str, count: usize) -> Result<CreateChatCompletionRequest> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(request_error)?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt(text, count))
                .build()
                .map_err(request_error)?
                .into(),
        ];

        let function = FunctionObjectArgs::default()
            .name(GENERATE_QUESTIONS_TOOL)
            .description("Generate multiple-choice questions with options and correct answers")
            .parameters(questions_schema())
            .build()
            .map_err(request_error)?;

        let tool = ChatCompletionToolArgs::default()
            .function(function)
            .build()
            .map_err(request_error)?;

        CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .tools(vec![tool])
            .tool_choice(ChatCompletionToolChoiceOption::Named(ChatCompletionNamedToolChoice {
                r#type: ChatCompletionToolType::Function,
                function: FunctionName {
                    name: GENERATE_QUESTIONS_TOOL.to_string(),
                },
            }))
            .build()
            .map_err(request_error)
    }
}

#[async_trait]
impl QuestionGenerator for OpenAiGenerator {
    async fn generate(&self, text: &str, count: usize) -> Result<Vec<GeneratedQuestion>> {
        let request = self.request(text, count)?;

        tracing::info!(
            "Requesting {} questions from {} ({})",
            count,
            self.client.config().api_base(),
            self.model
        );

        let completion = self.client.chat().create(request).await.map_err(|error| {
            tracing::warn!(error = &error as &dyn Error, "Completion call failed");
            response_error(error)
        })?;

        let arguments = function_arguments(completion)?;
        let questions = parse_generated_questions(&arguments)?;

        tracing::info!("Completion returned {} questions", questions.len());

        Ok(questions)
    }
}

fn request_error(error: OpenAIError) -> AppError {
    AppError::Completion(format!("invalid request: {}", error))
}

fn response_error(error: OpenAIError) -> AppError {
    match error {
        OpenAIError::JSONDeserialize(e) => AppError::MalformedCompletion(e.to_string()),
        other => AppError::Completion(other.to_string()),
    }
}

/// Arguments of the `generate_questions` call in the first choice
///
/// Falls back to the legacy `function_call` field when no tool call matches.
#[allow(deprecated)]
fn function_arguments(completion: CreateChatCompletionResponse) -> Result<String> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AppError::Completion("response has no choices".to_string()))?;

    message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| call.function)
        .chain(message.function_call)
        .find(|call| call.name == GENERATE_QUESTIONS_TOOL)
        .map(|call| call.arguments)
        .ok_or_else(|| AppError::Completion("model did not call generate_questions".to_string()))
}
