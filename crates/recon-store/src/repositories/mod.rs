pub mod endpoint;
pub mod host;
pub mod program;
pub mod scope_rule;
pub mod secondary;
pub mod service;

pub use endpoint::{EndpointFilter, EndpointPatch, EndpointRepository, NewEndpoint};
pub use host::{HostFilter, HostPatch, HostRepository, NewHost};
pub use program::{ProgramFilter, ProgramPatch, ProgramRepository};
pub use scope_rule::ScopeRuleRepository;
pub use secondary::{DnsRecordRepository, HostIpRepository, IpAddressRepository, ScannerExecutionRepository};
pub use service::{NewService, ServiceFilter, ServicePatch, ServiceRepository};
