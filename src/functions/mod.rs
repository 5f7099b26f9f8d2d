//! Functions an LLM agent can call.
//!
//! Each function describes itself (name, description, example arguments)
//! and is invoked with positional JSON arguments. Results are plain strings
//! fed back to the agent.

pub mod omen;

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::market::MarketClient;

pub use omen::{CreatePredictionMarket, RedeemWinningBets};

/// A callable action exposed to an agent framework.
#[async_trait]
pub trait AgentFunction: Send + Sync {
    /// Function name as shown to the agent.
    fn name(&self) -> &'static str;

    /// What the function does and when to use it.
    fn description(&self) -> String;

    /// Example positional arguments.
    fn example_args(&self) -> Vec<Value>;

    /// Invoke with positional arguments.
    async fn call(&self, args: &[Value]) -> Result<String>;
}

/// Serializable summary of a function, for listing to an agent.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    /// Function name.
    pub name: &'static str,
    /// Description.
    pub description: String,
    /// Example arguments.
    pub example_args: Vec<Value>,
}

impl FunctionSpec {
    /// Describe a function.
    pub fn of(function: &dyn AgentFunction) -> Self {
        Self {
            name: function.name(),
            description: function.description(),
            example_args: function.example_args(),
        }
    }
}

/// Functions that interact exclusively with Omen prediction markets.
pub fn omen_functions(client: Arc<dyn MarketClient>) -> Vec<Box<dyn AgentFunction>> {
    vec![
        Box::new(RedeemWinningBets::new(client.clone())),
        Box::new(CreatePredictionMarket::new(client)),
    ]
}

/// Find a function by name.
pub fn find_function<'a>(
    functions: &'a [Box<dyn AgentFunction>],
    name: &str,
) -> Option<&'a dyn AgentFunction> {
    functions
        .iter()
        .find(|f| f.name() == name)
        .map(|f| f.as_ref())
}

pub(crate) fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() != expected {
        return Err(AgentError::InvalidArguments {
            function: function.to_string(),
            reason: format!("expected {} arguments, got {}", expected, args.len()),
        });
    }
    Ok(())
}

pub(crate) fn arg_str<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::InvalidArguments {
            function: function.to_string(),
            reason: format!("argument {} must be a string", index),
        })
}

/// Read a USD amount given as a JSON number or numeric string.
pub(crate) fn arg_decimal(function: &str, args: &[Value], index: usize) -> Result<Decimal> {
    let invalid = || AgentError::InvalidArguments {
        function: function.to_string(),
        reason: format!("argument {} must be a number", index),
    };

    let text = match args.get(index) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        _ => return Err(invalid()),
    };

    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid())
}
