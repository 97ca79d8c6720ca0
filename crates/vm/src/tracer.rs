use bytes::Bytes;
use oxevm_common::{Address, U256};
use serde::Serialize;

use crate::errors::{InternalError, VMError};

/// How a traced frame was entered. Serialized in the upstream tracer's
/// spelling ("CALL", "STATICCALL", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallType {
    #[default]
    Call,
    CallCode,
    DelegateCall,
    StaticCall,
    Create,
    Create2,
}

/// Geth's callTracer (https://geth.ethereum.org/docs/developers/evm-tracing/built-in-tracers)
/// Use `CallTracer::disabled()` when tracing is not wanted.
#[derive(Debug, Default)]
pub struct CallTracer {
    /// Stack of open frames; after execution exactly one element remains,
    /// the rest having been folded into their parents' `calls`.
    pub callframes: Vec<TraceFrame>,
    /// If true, trace only the top call (a.k.a. the external transaction)
    pub only_top_call: bool,
    /// If active is set to false it won't trace.
    pub active: bool,
}

/// One traced frame, with its subcalls nested under `calls`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct TraceFrame {
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub from: Address,
    pub to: Address,
    #[serde(serialize_with = "to_hex")]
    pub value: U256,
    #[serde(serialize_with = "to_hex")]
    pub gas: u64,
    #[serde(rename = "gasUsed", serialize_with = "to_hex")]
    pub gas_used: u64,
    #[serde(serialize_with = "to_hex")]
    pub input: Bytes,
    #[serde(serialize_with = "to_hex")]
    pub output: Bytes,
    #[serde(serialize_with = "option_string_empty_as_str")]
    pub error: Option<String>,
    #[serde(rename = "revertReason", serialize_with = "option_string_empty_as_str")]
    pub revert_reason: Option<String>,
    pub calls: Vec<TraceFrame>,
}

impl CallTracer {
    pub fn new(only_top_call: bool) -> Self {
        CallTracer {
            callframes: vec![],
            only_top_call,
            active: true,
        }
    }

    /// This keeps the engine's code clean, like `self.tracer.enter(...)`,
    /// instead of something uglier when we don't want to trace.
    pub fn disabled() -> Self {
        CallTracer {
            active: false,
            ..Default::default()
        }
    }

    /// Starts trace call.
    pub fn enter(
        &mut self,
        call_type: CallType,
        from: Address,
        to: Address,
        value: U256,
        gas: u64,
        input: &Bytes, // For avoiding cloning when calling (cleaner code)
    ) {
        if !self.active {
            return;
        }
        if self.only_top_call && !self.callframes.is_empty() {
            // Only create callframe if it's the first one to be created.
            return;
        }
        let callframe = TraceFrame::new(call_type, from, to, value, gas, input.clone());
        self.callframes.push(callframe);
    }

    /// Exits trace call. The revert payload doubles as the revert reason
    /// when it decodes as UTF-8.
    pub fn exit(
        &mut self,
        gas_used: u64,
        output: &Bytes,
        error: Option<&VMError>,
        is_top_call: bool,
    ) -> Result<(), InternalError> {
        if !self.active {
            return Ok(());
        }
        if self.only_top_call && !is_top_call {
            // We just want to register top call
            return Ok(());
        }
        let (error, revert_reason) = match error {
            Some(err) if err.is_revert() => {
                let reason = String::from_utf8(output.to_vec()).ok();
                (Some(err.to_string()), reason)
            }
            Some(err) => (Some(err.to_string()), None),
            None => (None, None),
        };
        self.record_exit(gas_used, output.clone(), error, revert_reason)
    }

    /// Has no validations because it's a private method.
    fn record_exit(
        &mut self,
        gas_used: u64,
        output: Bytes,
        error: Option<String>,
        revert_reason: Option<String>,
    ) -> Result<(), InternalError> {
        let mut executed_callframe = self
            .callframes
            .pop()
            .ok_or(InternalError::CouldNotPopCallframe)?;

        executed_callframe.process_output(gas_used, output, error, revert_reason);

        // Append executed callframe to parent callframe if appropriate.
        if let Some(parent_callframe) = self.callframes.last_mut() {
            parent_callframe.calls.push(executed_callframe);
        } else {
            self.callframes.push(executed_callframe);
        }
        Ok(())
    }
}

impl TraceFrame {
    pub fn new(
        call_type: CallType,
        from: Address,
        to: Address,
        value: U256,
        gas: u64,
        input: Bytes,
    ) -> Self {
        Self {
            call_type,
            from,
            to,
            value,
            gas,
            input,
            ..Default::default()
        }
    }

    pub fn process_output(
        &mut self,
        gas_used: u64,
        output: Bytes,
        error: Option<String>,
        revert_reason: Option<String>,
    ) {
        self.gas_used = gas_used;
        self.output = output;
        self.error = error;
        self.revert_reason = revert_reason;
    }
}

fn to_hex<T, S>(x: &T, s: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::LowerHex,
    S: serde::Serializer,
{
    s.serialize_str(&format!("0x{:x}", x))
}

fn option_string_empty_as_str<S>(x: &Option<String>, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(x.as_deref().unwrap_or(""))
}
