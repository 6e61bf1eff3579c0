//! Turn engines, configuration, and orchestration for the Outbreak
//! simulation.
//!
//! Two model variants share one interface, [`OutbreakModel`]:
//!
//! - [`TurnEngine`] -- discrete agents on a fenced grid. Fences block
//!   movement; infected agents hunt by BFS.
//! - [`StockFlowEngine`] -- aggregate stocks. Fences damp the bite rate
//!   through the containment multiplier.
//!
//! # Modules
//!
//! - [`arena`] -- Stable-id storage for grid agents.
//! - [`clock`] -- Day counter.
//! - [`command`] -- [`CommandSource`] trait and scripted fence placement.
//! - [`config`] -- Configuration loading from `outbreak-config.yaml` into
//!   strongly-typed structs.
//! - [`model`] -- The [`OutbreakModel`] trait and [`TurnError`].
//! - [`outcome`] -- End-of-turn win/loss evaluation.
//! - [`runner`] -- The headless run loop, [`run_simulation`].
//! - [`shuffle`] -- Fisher-Yates with an injected RNG.
//! - [`stock_flow`] -- The aggregate engine.
//! - [`turn`] -- The grid engine.
//!
//! [`CommandSource`]: command::CommandSource
//! [`OutbreakModel`]: model::OutbreakModel
//! [`TurnError`]: model::TurnError
//! [`run_simulation`]: runner::run_simulation
//! [`TurnEngine`]: turn::TurnEngine
//! [`StockFlowEngine`]: stock_flow::StockFlowEngine

pub mod arena;
pub mod clock;
pub mod command;
pub mod config;
pub mod model;
pub mod outcome;
pub mod runner;
pub mod shuffle;
pub mod stock_flow;
pub mod turn;
