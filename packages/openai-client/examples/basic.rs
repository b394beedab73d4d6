//! Chat completion and one function-calling round trip.

use openai_client::{ChatRequest, FunctionRequest, Message, OpenAIClient, ToolDefinition};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchArgs {
    /// Free-text web search query.
    query: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize from environment
    let client = OpenAIClient::from_env()?;

    println!("=== Chat Completion ===");
    let response = client
        .chat_completion(
            ChatRequest::new("gpt-4o-mini")
                .message(Message::system("You are a helpful assistant."))
                .message(Message::user("What is Rust in one sentence?"))
                .temperature(0.0)
                .max_tokens(100),
        )
        .await?;
    println!("Response: {}", response.content);

    println!("\n=== Function Calling ===");
    let tools = [ToolDefinition::for_args::<SearchArgs>(
        "web_search",
        "Search the web for up-to-date information.",
    )];
    let messages = vec![
        Message::user("Who won the 2022 World Cup?").to_value(),
    ];
    let response = client
        .function_calling(FunctionRequest::new("gpt-4o-mini", messages, &tools))
        .await?;

    if response.wants_tools() {
        for call in &response.tool_calls {
            let args: SearchArgs = call.parse_args()?;
            println!("Model wants {}({:?})", call.name, args.query);
        }
    } else {
        println!("Answer: {}", response.content.unwrap_or_default());
    }

    Ok(())
}
