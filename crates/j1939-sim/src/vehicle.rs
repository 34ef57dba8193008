//! Simulated vehicle bus

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use j1939_core::{
    DiagnosticGateway, DirectedResponse, GatewayError, GatewayResult, ModuleInfo, ModuleRegistry,
    RequestResult,
};
use j1939_packets::{pgn, AckResponse, Acknowledgment, DiagnosticMessage, Packet};
use parking_lot::RwLock;
use tracing::debug;

use crate::config::{EraseOn, ModuleConfig, ReplyKind, Scope, VehicleConfig};

/// What a module sends back for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Data(Vec<u8>),
    Ack,
    Nack,
    Silent,
}

impl Reply {
    /// Answer with the encoded bytes of `message`
    pub fn message<M: DiagnosticMessage>(message: &M) -> Self {
        Reply::Data(message.packet().bytes().to_vec())
    }
}

#[derive(Debug, Clone)]
struct Response {
    pgn: u32,
    scope: Scope,
    reply: Reply,
}

impl Response {
    fn from_def(def: &crate::config::ResponseDef) -> Self {
        let reply = match def.reply {
            ReplyKind::Data => Reply::Data(def.data.clone().unwrap_or_default()),
            ReplyKind::Ack => Reply::Ack,
            ReplyKind::Nack => Reply::Nack,
            ReplyKind::Silent => Reply::Silent,
        };
        Self {
            pgn: def.pgn,
            scope: def.scope,
            reply,
        }
    }
}

/// First entry of `table` answering `pgn` for the request kind
fn lookup(table: &[Response], pgn: u32, global: bool) -> Option<&Reply> {
    table
        .iter()
        .find(|r| r.pgn == pgn && r.scope.matches(global))
        .map(|r| &r.reply)
}

/// One simulated module
#[derive(Debug, Clone)]
pub struct SimModule {
    address: u8,
    function: u8,
    obd: bool,
    erase_on: EraseOn,
    responses: Vec<Response>,
    after_clear: Vec<Response>,
    cleared: bool,
}

impl SimModule {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            function: 0,
            obd: false,
            erase_on: EraseOn::Global,
            responses: Vec::new(),
            after_clear: Vec::new(),
            cleared: false,
        }
    }

    pub fn obd(mut self) -> Self {
        self.obd = true;
        self
    }

    pub fn erase_on(mut self, erase_on: EraseOn) -> Self {
        self.erase_on = erase_on;
        self
    }

    /// Answer both global and directed requests for `pgn`
    pub fn respond(self, pgn: u32, reply: Reply) -> Self {
        self.respond_to(pgn, Scope::Both, reply)
    }

    pub fn respond_to(mut self, pgn: u32, scope: Scope, reply: Reply) -> Self {
        self.responses.push(Response { pgn, scope, reply });
        self
    }

    /// Answer with `message` for both request kinds
    pub fn with_message<M: DiagnosticMessage>(self, message: &M) -> Self {
        self.respond(M::PGN, Reply::message(message))
    }

    /// Answer with `message` once the module has been cleared
    pub fn after_clear<M: DiagnosticMessage>(self, message: &M) -> Self {
        self.respond_after_clear(M::PGN, Reply::message(message))
    }

    /// Answer `pgn` with `reply` once the module has been cleared
    pub fn respond_after_clear(mut self, pgn: u32, reply: Reply) -> Self {
        self.after_clear.push(Response {
            pgn,
            scope: Scope::Both,
            reply,
        });
        self
    }

    fn from_config(config: &ModuleConfig) -> Self {
        Self {
            address: config.address,
            function: config.function,
            obd: config.obd,
            erase_on: config.erase_on,
            responses: config.responses.iter().map(Response::from_def).collect(),
            after_clear: config.after_clear.iter().map(Response::from_def).collect(),
            cleared: false,
        }
    }

    fn find_reply(&self, pgn: u32, global: bool) -> Option<&Reply> {
        if self.cleared {
            if let Some(reply) = lookup(&self.after_clear, pgn, global) {
                return Some(reply);
            }
        }
        lookup(&self.responses, pgn, global)
    }

    /// Reply to a request, applying DM11 side effects
    fn answer(&mut self, pgn: u32, global: bool) -> Reply {
        let reply = match self.find_reply(pgn, global) {
            Some(reply) => reply.clone(),
            // unknown PGNs are NACKed when asked directly and ignored on broadcast
            None if global => Reply::Silent,
            None => Reply::Nack,
        };
        if pgn == pgn::DM11 && self.erase_on.erases(global) {
            debug!(address = self.address, "Simulated module cleared");
            self.cleared = true;
        }
        reply
    }
}

/// A vehicle made of simulated modules, answering requests from their
/// response tables.
pub struct SimulatedVehicle {
    latency: Duration,
    connected: AtomicBool,
    modules: RwLock<BTreeMap<u8, SimModule>>,
    requests: RwLock<VecDeque<(u32, Option<u8>)>>,
    request_log_capacity: usize,
}

/// Requests kept in the log by default; older entries are dropped first
pub const DEFAULT_REQUEST_LOG_CAPACITY: usize = 1024;

impl Default for SimulatedVehicle {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVehicle {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            connected: AtomicBool::new(true),
            modules: RwLock::new(BTreeMap::new()),
            requests: RwLock::new(VecDeque::new()),
            request_log_capacity: DEFAULT_REQUEST_LOG_CAPACITY,
        }
    }

    pub fn from_config(config: &VehicleConfig) -> Self {
        let vehicle = Self::new().with_latency(Duration::from_millis(config.latency_ms));
        for module in &config.modules {
            vehicle.add_module(SimModule::from_config(module));
        }
        vehicle
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Keep at most `capacity` requests in the log
    pub fn with_request_log_capacity(mut self, capacity: usize) -> Self {
        self.request_log_capacity = capacity;
        self
    }

    pub fn with_module(self, module: SimModule) -> Self {
        self.add_module(module);
        self
    }

    /// Add or replace a module
    pub fn add_module(&self, module: SimModule) {
        self.modules.write().insert(module.address, module);
    }

    /// Set connection state. A disconnected vehicle fails every request.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Put every module back into its pre-clear state
    pub fn reset(&self) {
        for module in self.modules.write().values_mut() {
            module.cleared = false;
        }
    }

    pub fn is_cleared(&self, address: u8) -> bool {
        self.modules.read().get(&address).is_some_and(|m| m.cleared)
    }

    /// Most recent requests as `(pgn, destination)`, oldest first; `None` is global
    pub fn request_log(&self) -> Vec<(u32, Option<u8>)> {
        self.requests.read().iter().copied().collect()
    }

    pub fn clear_request_log(&self) {
        self.requests.write().clear();
    }

    /// Registry describing the configured modules, without baselines
    pub fn registry(&self) -> ModuleRegistry {
        ModuleRegistry::from_modules(self.modules.read().values().map(|m| ModuleInfo {
            function: m.function,
            obd: m.obd,
            ..ModuleInfo::new(m.address)
        }))
    }

    async fn begin(&self, pgn: u32, destination: Option<u8>) -> GatewayResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("simulated vehicle disconnected".to_string()));
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let mut requests = self.requests.write();
        if self.request_log_capacity == 0 {
            return Ok(());
        }
        while requests.len() >= self.request_log_capacity {
            requests.pop_front();
        }
        requests.push_back((pgn, destination));
        Ok(())
    }
}

#[async_trait]
impl DiagnosticGateway for SimulatedVehicle {
    async fn request_global(&self, pgn: u32) -> GatewayResult<RequestResult<Packet>> {
        self.begin(pgn, None).await?;
        let result = self.answer_global(pgn);
        debug!(pgn, packets = result.packets.len(), acks = result.acks.len(), "Simulated global request");
        Ok(result)
    }

    async fn request_directed(&self, pgn: u32, address: u8) -> GatewayResult<DirectedResponse<Packet>> {
        self.begin(pgn, Some(address)).await?;
        Ok(self.answer_directed(pgn, address))
    }

    /// Commands are answered from the same tables as requests; the payload
    /// is only logged
    async fn send_global(&self, pgn: u32, data: &[u8]) -> GatewayResult<RequestResult<Packet>> {
        self.begin(pgn, None).await?;
        let result = self.answer_global(pgn);
        debug!(
            pgn,
            command = %hex::encode_upper(data),
            packets = result.packets.len(),
            acks = result.acks.len(),
            "Simulated global command"
        );
        Ok(result)
    }

    async fn send_directed(&self, pgn: u32, address: u8, data: &[u8]) -> GatewayResult<DirectedResponse<Packet>> {
        self.begin(pgn, Some(address)).await?;
        debug!(pgn, address, command = %hex::encode_upper(data), "Simulated directed command");
        Ok(self.answer_directed(pgn, address))
    }
}

impl SimulatedVehicle {
    fn answer_global(&self, pgn: u32) -> RequestResult<Packet> {
        let mut result = RequestResult::empty();
        for module in self.modules.write().values_mut() {
            let address = module.address;
            match module.answer(pgn, true) {
                Reply::Data(data) => result.packets.push(Packet::new(pgn, address, data)),
                Reply::Ack => result.acks.push(Acknowledgment::create(address, AckResponse::Ack, pgn)),
                Reply::Nack => result.acks.push(Acknowledgment::create(address, AckResponse::Nack, pgn)),
                Reply::Silent => {}
            }
        }
        result
    }

    fn answer_directed(&self, pgn: u32, address: u8) -> DirectedResponse<Packet> {
        let reply = match self.modules.write().get_mut(&address) {
            Some(module) => module.answer(pgn, false),
            None => Reply::Silent,
        };
        debug!(pgn, address, ?reply, "Simulated directed request");
        match reply {
            Reply::Data(data) => DirectedResponse::Packet(Packet::new(pgn, address, data)),
            Reply::Ack => DirectedResponse::Ack(Acknowledgment::create(address, AckResponse::Ack, pgn)),
            Reply::Nack => DirectedResponse::Ack(Acknowledgment::create(address, AckResponse::Nack, pgn)),
            Reply::Silent => DirectedResponse::Absent,
        }
    }
}
