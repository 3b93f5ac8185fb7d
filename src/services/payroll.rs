// src/services/payroll.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        AssignmentId, BulkUpsertRequest, DeductionType, EditEntryRequest, EntryView,
        PayAllOutcome, PayIndividualRequest, PayrollEntry, PeriodTotals, PeriodView, Period,
        RunStatus,
    },
    services::{backend::PayrollBackend, lifecycle, reconcile::merge_preserving_paid},
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

/// Everything the engine knows about one payroll month.
#[derive(Debug, Clone)]
pub struct PeriodLedger {
    pub period: Period,
    pub entries: BTreeMap<AssignmentId, PayrollEntry>,
    pub deduction_types: Vec<DeductionType>,
}

impl PeriodLedger {
    fn new(period: Period, entries: Vec<PayrollEntry>, deduction_types: Vec<DeductionType>) -> Self {
        Self {
            period,
            entries: entries.into_iter().map(|e| (e.assignment_id, e)).collect(),
            deduction_types,
        }
    }

    pub fn view(&self) -> PeriodView {
        let paid_count = self.entries.values().filter(|e| e.is_paid()).count();
        let total_net_salary: Decimal = self.entries.values().map(|e| e.net_salary).sum();

        PeriodView {
            period: self.period,
            entries: self.entries.values().cloned().map(EntryView::from).collect(),
            deduction_types: self.deduction_types.clone(),
            totals: PeriodTotals {
                total_net_salary,
                paid_count,
                draft_count: self.entries.len() - paid_count,
            },
        }
    }
}

/// Payroll engine shared by all requests. Cheap to clone.
#[derive(Clone)]
pub struct PayrollEngine {
    backend: Arc<dyn PayrollBackend>,
    ledgers: Arc<RwLock<HashMap<Period, PeriodLedger>>>,
    // Serializes save / pay / pay-all so persist-then-pay never interleaves
    mutations: Arc<Mutex<()>>,
    reconcile_delay: Duration,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl PayrollEngine {
    pub fn new(backend: Arc<dyn PayrollBackend>, reconcile_delay: Duration) -> Self {
        Self {
            backend,
            ledgers: Arc::new(RwLock::new(HashMap::new())),
            mutations: Arc::new(Mutex::new(())),
            reconcile_delay,
        }
    }

    /// Cheap round-trip used by the health check.
    pub async fn probe_backend(&self) -> AppResult<()> {
        self.backend.fetch_deduction_types().await.map(|_| ())
    }

    /// Entry rows and deduction types are fetched concurrently. Missing
    /// deduction types only degrade the view; missing rows fail the load.
    async fn fetch_period(&self, period: Period) -> AppResult<(Vec<PayrollEntry>, Vec<DeductionType>)> {
        let (rows, types) = tokio::join!(
            self.backend.fetch_period_rows(period),
            self.backend.fetch_deduction_types()
        );

        let types = types.unwrap_or_else(|e| {
            warn!("Failed to fetch deduction types for {}: {}", period, e);
            Vec::new()
        });
        let rows = rows.inspect_err(|e| error!("Failed to fetch payroll rows for {}: {}", period, e))?;

        let today = today();
        let entries = rows
            .into_iter()
            .map(|row| lifecycle::entry_from_row(row, period, &types, today))
            .collect::<AppResult<Vec<_>>>()
            .inspect_err(|e| error!("Unusable payroll rows for {}: {}", period, e))?;
        Ok((entries, types))
    }

    /// Fresh load: the backend is trusted completely.
    pub async fn load_period(&self, period: Period) -> AppResult<PeriodView> {
        let (entries, types) = self.fetch_period(period).await?;
        let ledger = PeriodLedger::new(period, entries, types);
        let view = ledger.view();

        info!(
            "Loaded payroll for {}: {} entries ({} paid)",
            period,
            ledger.entries.len(),
            view.totals.paid_count
        );
        self.ledgers.write().await.insert(period, ledger);
        Ok(view)
    }

    /// Cached view of the period, loading it on first use.
    pub async fn period_view(&self, period: Period) -> AppResult<PeriodView> {
        if let Some(ledger) = self.ledgers.read().await.get(&period) {
            return Ok(ledger.view());
        }
        self.load_period(period).await
    }

    /// Re-fetch after a mutation. Locally confirmed payments survive a stale
    /// read; everything else is replaced by what the backend reports.
    pub async fn reconcile(&self, period: Period) -> AppResult<PeriodView> {
        let (fresh, types) = self.fetch_period(period).await?;

        let mut ledgers = self.ledgers.write().await;
        let ledger = match ledgers.get(&period) {
            Some(previous) => PeriodLedger {
                period,
                entries: merge_preserving_paid(&previous.entries, fresh),
                deduction_types: if types.is_empty() {
                    previous.deduction_types.clone()
                } else {
                    types
                },
            },
            None => PeriodLedger::new(period, fresh, types),
        };

        let view = ledger.view();
        ledgers.insert(period, ledger);
        Ok(view)
    }

    fn schedule_reconcile(&self, period: Period) {
        let engine = self.clone();
        let delay = self.reconcile_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = engine.reconcile(period).await {
                // Local state stays as it is; the next load will catch up
                warn!("Post-payment refresh for {} failed: {}", period, e);
            }
        });
    }

    async fn ensure_loaded(&self, period: Period) -> AppResult<()> {
        if !self.ledgers.read().await.contains_key(&period) {
            self.load_period(period).await?;
        }
        Ok(())
    }

    async fn entry(
        &self,
        period: Period,
        assignment_id: AssignmentId,
    ) -> AppResult<(PayrollEntry, Vec<DeductionType>)> {
        self.ensure_loaded(period).await?;

        let ledgers = self.ledgers.read().await;
        let ledger = ledgers
            .get(&period)
            .ok_or_else(|| AppError::NotFound(format!("Payroll for {} is not loaded", period)))?;
        let entry = ledger.entries.get(&assignment_id).cloned().ok_or_else(|| {
            AppError::NotFound(format!(
                "No payroll entry for assignment {} in {}",
                assignment_id, period
            ))
        })?;
        Ok((entry, ledger.deduction_types.clone()))
    }

    async fn cached_entry(&self, period: Period, assignment_id: AssignmentId) -> Option<PayrollEntry> {
        self.ledgers
            .read()
            .await
            .get(&period)
            .and_then(|l| l.entries.get(&assignment_id).cloned())
    }

    /// Called under the mutation lock. A locally PAID entry is rejected
    /// without touching the network; otherwise the period is re-fetched so
    /// that whatever gets persisted starts from the backend's current values.
    async fn current_draft(
        &self,
        period: Period,
        assignment_id: AssignmentId,
    ) -> AppResult<(PayrollEntry, Vec<DeductionType>)> {
        if let Some(cached) = self.cached_entry(period, assignment_id).await {
            lifecycle::ensure_draft(&cached)?;
        }
        self.reconcile(period).await?;

        let (entry, types) = self.entry(period, assignment_id).await?;
        lifecycle::ensure_draft(&entry)?;
        Ok((entry, types))
    }

    async fn store(&self, entry: PayrollEntry) {
        if let Some(ledger) = self.ledgers.write().await.get_mut(&entry.period) {
            ledger.entries.insert(entry.assignment_id, entry);
        }
    }

    async fn persist(&self, period: Period, entries: &[PayrollEntry], user_id: i64) -> AppResult<()> {
        let request = BulkUpsertRequest {
            month: period.month,
            year: period.year,
            entries: entries.iter().map(lifecycle::to_payload).collect(),
            created_by_user_id: user_id,
        };
        self.backend.upsert_entries(&request).await
    }

    /// DRAFT --edit--> DRAFT
    pub async fn save_entry(
        &self,
        period: Period,
        assignment_id: AssignmentId,
        edit: &EditEntryRequest,
        user_id: i64,
    ) -> AppResult<EntryView> {
        let _guard = self.mutations.lock().await;

        let (entry, types) = self.current_draft(period, assignment_id).await?;
        let edited = lifecycle::apply_edit(&entry, edit, &types, today())?;

        self.persist(period, std::slice::from_ref(&edited), user_id).await?;
        info!(
            "Saved payroll entry for assignment {} in {} (net {})",
            assignment_id, period, edited.net_salary
        );
        self.store(edited.clone()).await;

        // Pick up ids the backend assigned on first save
        if let Err(e) = self.reconcile(period).await {
            warn!("Refresh after saving assignment {} failed: {}", assignment_id, e);
        }

        let saved = self
            .cached_entry(period, assignment_id)
            .await
            .unwrap_or(edited);
        Ok(saved.into())
    }

    /// DRAFT --pay--> PAID for one entry: persist, then pay. The entry only
    /// turns PAID locally once the pay call itself succeeded.
    pub async fn pay_entry(
        &self,
        period: Period,
        assignment_id: AssignmentId,
        user_id: i64,
    ) -> AppResult<EntryView> {
        let _guard = self.mutations.lock().await;

        let (mut entry, _) = self.current_draft(period, assignment_id).await?;
        self.persist(period, std::slice::from_ref(&entry), user_id).await?;

        let request = PayIndividualRequest {
            month: period.month,
            year: period.year,
            assignment_id,
            employee_id: entry.employee_id,
        };
        let response = self
            .backend
            .pay_individual(&request)
            .await
            .map_err(AppError::into_payment_failed)
            .inspect_err(|e| error!("Payment for assignment {} failed: {}", assignment_id, e))?;

        if let Some(status) = response.status.as_deref() {
            if RunStatus::normalize(Some(status)) != RunStatus::Paid {
                warn!(
                    "Backend answered pay-individual for assignment {} with status {:?}",
                    assignment_id, status
                );
            }
        }

        let pay_date = response.pay_date.unwrap_or_else(today);
        // A delayed reconcile may have replaced the ledger entry meanwhile
        let paid = {
            let mut ledgers = self.ledgers.write().await;
            match ledgers
                .get_mut(&period)
                .and_then(|l| l.entries.get_mut(&assignment_id))
            {
                Some(current) => {
                    lifecycle::mark_paid(current, pay_date);
                    current.clone()
                }
                None => {
                    lifecycle::mark_paid(&mut entry, pay_date);
                    entry
                }
            }
        };
        info!(
            "Assignment {} marked PAID for {} on {}",
            assignment_id, period, pay_date
        );

        self.schedule_reconcile(period);
        Ok(paid.into())
    }

    /// DRAFT --pay-all--> PAID for every DRAFT entry of the period: one
    /// upsert, one pay-all, then all of them flip together.
    pub async fn pay_all(&self, period: Period, user_id: i64) -> AppResult<PayAllOutcome> {
        let _guard = self.mutations.lock().await;

        self.reconcile(period).await?;
        let drafts: Vec<PayrollEntry> = self
            .ledgers
            .read()
            .await
            .get(&period)
            .map(|l| l.entries.values().filter(|e| !e.is_paid()).cloned().collect())
            .unwrap_or_default();

        if drafts.is_empty() {
            return Err(AppError::NothingToPay);
        }

        // TODO: reject drafts without a gross salary once product confirms
        // that pay-all should validate per entry
        // PAID entries are frozen, so only drafts are re-sent
        self.persist(period, &drafts, user_id).await?;

        let response = self
            .backend
            .pay_all(period)
            .await
            .map_err(AppError::into_payment_failed)
            .inspect_err(|e| error!("Pay-all for {} failed: {}", period, e))?;
        let pay_date = response.pay_date.unwrap_or_else(today);

        let mut paid = Vec::with_capacity(drafts.len());
        {
            let mut ledgers = self.ledgers.write().await;
            if let Some(ledger) = ledgers.get_mut(&period) {
                for draft in &drafts {
                    if let Some(entry) = ledger.entries.get_mut(&draft.assignment_id) {
                        lifecycle::mark_paid(entry, pay_date);
                        paid.push(EntryView::from(entry.clone()));
                    }
                }
            }
        }

        info!("Pay-all for {}: {} entries marked PAID on {}", period, paid.len(), pay_date);
        self.schedule_reconcile(period);

        Ok(PayAllOutcome {
            period,
            paid_count: paid.len(),
            pay_date,
            entries: paid,
        })
    }
}
