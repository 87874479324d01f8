//! Lighter-weight repositories for entities whose contract is plain
//! create/get/find_many/upsert — no bespoke merge semantics beyond a
//! `(unique key) DO UPDATE` upsert.

use uuid::Uuid;

use recon_core::Id;

use crate::entities::{DnsRecord, HostIp, IpAddressRow, ScannerExecution};
use crate::error::StoreError;
use crate::uow::UnitOfWork;

pub struct IpAddressRepository;

impl IpAddressRepository {
    pub async fn upsert(
        uow: &mut UnitOfWork,
        program_id: Id,
        address: &str,
        version: &str,
        in_scope: bool,
    ) -> Result<IpAddressRow, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, IpAddressRow>(
            r#"
            INSERT INTO ip_addresses (id, program_id, address, version, in_scope, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (program_id, address) DO UPDATE SET in_scope = EXCLUDED.in_scope
            RETURNING id, program_id, address, version, in_scope, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(address)
        .bind(version)
        .bind(in_scope)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    pub async fn get_by_address(
        uow: &mut UnitOfWork,
        program_id: Id,
        address: &str,
    ) -> Result<Option<IpAddressRow>, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, IpAddressRow>(
            "SELECT id, program_id, address, version, in_scope, created_at
             FROM ip_addresses WHERE program_id = $1 AND address = $2",
        )
        .bind(program_id)
        .bind(address)
        .fetch_optional(&mut **exec)
        .await?;
        Ok(row)
    }

    /// Upsert every `(address, version, in_scope)` triple for `program_id`
    /// in one round trip, on the `(program_id, address)` unique constraint.
    pub async fn bulk_upsert(
        uow: &mut UnitOfWork,
        program_id: Id,
        items: &[(String, String, bool)],
    ) -> Result<Vec<IpAddressRow>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = items.iter().map(|_| Uuid::new_v4()).collect();
        let addresses: Vec<&str> = items.iter().map(|(a, _, _)| a.as_str()).collect();
        let versions: Vec<&str> = items.iter().map(|(_, v, _)| v.as_str()).collect();
        let in_scopes: Vec<bool> = items.iter().map(|(_, _, s)| *s).collect();

        let exec = uow.executor();
        let rows = sqlx::query_as::<_, IpAddressRow>(
            r#"
            INSERT INTO ip_addresses (id, program_id, address, version, in_scope, created_at)
            SELECT id, $2, address, version, in_scope, now()
            FROM UNNEST($1::uuid[], $3::text[], $4::text[], $5::bool[]) AS t(id, address, version, in_scope)
            ON CONFLICT (program_id, address) DO UPDATE SET in_scope = EXCLUDED.in_scope
            RETURNING id, program_id, address, version, in_scope, created_at
            "#,
        )
        .bind(&ids)
        .bind(program_id)
        .bind(&addresses)
        .bind(&versions)
        .bind(&in_scopes)
        .fetch_all(&mut **exec)
        .await?;
        Ok(rows)
    }
}

pub struct HostIpRepository;

impl HostIpRepository {
    /// Link a host to an IP, recording which tool discovered it. Idempotent
    /// on `(host_id, ip_id)`.
    pub async fn link(
        uow: &mut UnitOfWork,
        host_id: Id,
        ip_id: Id,
        source: &str,
    ) -> Result<HostIp, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, HostIp>(
            r#"
            INSERT INTO host_ips (id, host_id, ip_id, source, created_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (host_id, ip_id) DO UPDATE SET source = EXCLUDED.source
            RETURNING id, host_id, ip_id, source, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(host_id)
        .bind(ip_id)
        .bind(source)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }
}

pub struct DnsRecordRepository;

impl DnsRecordRepository {
    /// Upsert on `(host_id, type, value)`. `is_wildcard` is supplied by the
    /// caller, which has already probed a randomized sibling hostname.
    pub async fn upsert(
        uow: &mut UnitOfWork,
        host_id: Id,
        record_type: &str,
        value: &str,
        ttl: Option<i32>,
        priority: Option<i32>,
        is_wildcard: bool,
    ) -> Result<DnsRecord, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, DnsRecord>(
            r#"
            INSERT INTO dns_records (id, host_id, record_type, value, ttl, priority, is_wildcard)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (host_id, record_type, value) DO UPDATE
                SET ttl = EXCLUDED.ttl, priority = EXCLUDED.priority, is_wildcard = EXCLUDED.is_wildcard
            RETURNING id, host_id, record_type, value, ttl, priority, is_wildcard
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(host_id)
        .bind(record_type)
        .bind(value)
        .bind(ttl)
        .bind(priority)
        .bind(is_wildcard)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }
}

pub struct ScannerExecutionRepository;

impl ScannerExecutionRepository {
    pub async fn create(
        uow: &mut UnitOfWork,
        program_id: Id,
        template_id: Option<Id>,
    ) -> Result<ScannerExecution, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, ScannerExecution>(
            r#"
            INSERT INTO scanner_executions (id, program_id, template_id, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id, program_id, template_id, status, started_at, finished_at, error
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(program_id)
        .bind(template_id)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }

    pub async fn transition(
        uow: &mut UnitOfWork,
        id: Id,
        status: &str,
        error: Option<&str>,
    ) -> Result<ScannerExecution, StoreError> {
        let exec = uow.executor();
        let row = sqlx::query_as::<_, ScannerExecution>(
            r#"
            UPDATE scanner_executions
            SET status = $2,
                error = $3,
                started_at = CASE WHEN $2 = 'running' THEN now() ELSE started_at END,
                finished_at = CASE WHEN $2 IN ('completed', 'failed', 'cancelled') THEN now() ELSE finished_at END
            WHERE id = $1
            RETURNING id, program_id, template_id, status, started_at, finished_at, error
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error)
        .fetch_one(&mut **exec)
        .await?;
        Ok(row)
    }
}
