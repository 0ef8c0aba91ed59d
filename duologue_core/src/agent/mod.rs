mod handle;

pub use handle::{
    AgentHandle, CostSummary, ExchangeResult, TerminationPredicate, DEFAULT_SUMMARY_PROMPT,
    TERMINATION_SENTINEL,
};
