#[cfg(test)]
mod tests {
    use crate::accounts::{AccountUpdate, NewAccount};
    use crate::errors::{Error, Result};
    use crate::groups::{GroupUpdate, NewGroup};
    use crate::investments::{InvestmentUpdate, NewInvestment};
    use crate::plan::{PlanRepositoryTrait, PlanService, PlanServiceTrait, PlanSnapshot};
    use crate::schedule::{CompletionCount, Recurrence, RecurrenceType};
    use crate::settings::PlannerSettings;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex, Weak};

    // --- Mock PlanRepository ---
    #[derive(Clone, Default)]
    struct MockPlanRepository {
        stored: Arc<Mutex<Option<PlanSnapshot>>>,
        saves: Arc<Mutex<usize>>,
    }

    impl MockPlanRepository {
        fn with_plan(snapshot: PlanSnapshot) -> Self {
            let repo = Self::default();
            *repo.stored.lock().unwrap() = Some(snapshot);
            repo
        }

        fn save_count(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    #[async_trait]
    impl PlanRepositoryTrait for MockPlanRepository {
        async fn load_plan(&self) -> Result<Option<PlanSnapshot>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save_plan(&self, snapshot: &PlanSnapshot) -> Result<()> {
            *self.stored.lock().unwrap() = Some(snapshot.clone());
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    // --- Mock that always fails to save ---
    struct FailingRepository;

    #[async_trait]
    impl PlanRepositoryTrait for FailingRepository {
        async fn load_plan(&self) -> Result<Option<PlanSnapshot>> {
            Ok(None)
        }

        async fn save_plan(&self, _snapshot: &PlanSnapshot) -> Result<()> {
            Err(Error::Repository("offline".to_string()))
        }
    }

    // --- Mock whose save races with an update from another session ---
    struct RemoteUpdateDuringSave {
        service: Mutex<Option<Weak<PlanService>>>,
        remote: PlanSnapshot,
        saved: Mutex<Vec<PlanSnapshot>>,
    }

    #[async_trait]
    impl PlanRepositoryTrait for RemoteUpdateDuringSave {
        async fn load_plan(&self) -> Result<Option<PlanSnapshot>> {
            Ok(None)
        }

        async fn save_plan(&self, snapshot: &PlanSnapshot) -> Result<()> {
            self.saved.lock().unwrap().push(snapshot.clone());
            let service = self.service.lock().unwrap().take();
            if let Some(service) = service.and_then(|weak| weak.upgrade()) {
                service.apply_remote_snapshot(self.remote.clone())?;
            }
            Ok(())
        }
    }

    // ==================== Helper Functions ====================

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn service(repo: MockPlanRepository) -> PlanService {
        PlanService::new(Arc::new(repo), PlannerSettings::default())
    }

    fn new_account(id: &str, currency: &str, balance: Decimal) -> NewAccount {
        NewAccount {
            id: Some(id.to_string()),
            name: format!("Account {}", id),
            currency: currency.to_string(),
            balance,
        }
    }

    fn new_group(id: &str, percentage: Decimal, parent: Option<&str>) -> NewGroup {
        NewGroup {
            id: Some(id.to_string()),
            name: id.to_string(),
            color: "#8b7ec8".to_string(),
            percentage: Some(percentage),
            parent_id: parent.map(str::to_string),
        }
    }

    fn new_investment(id: &str, percentage: Decimal, priority: &[&str]) -> NewInvestment {
        NewInvestment {
            id: Some(id.to_string()),
            name: id.to_uppercase(),
            percentage,
            account_priority: priority.iter().map(|s| s.to_string()).collect(),
            group_id: None,
            recurrence: Recurrence::new(RecurrenceType::Monthly, d(2024, 1, 1))
                .until(d(2024, 12, 1)),
        }
    }

    // ==================== Mutation Tests ====================

    #[test]
    fn test_add_account_generates_id_and_validates() {
        let svc = service(MockPlanRepository::default());
        let account = svc
            .add_account(NewAccount {
                id: None,
                name: " Savings ".to_string(),
                currency: "THB".to_string(),
                balance: dec!(500),
            })
            .unwrap();
        assert!(!account.id.is_empty());
        assert_eq!(account.name, "Savings");

        assert!(matches!(
            svc.add_account(new_account("eur", "EUR", dec!(1))),
            Err(Error::UnsupportedCurrency(_))
        ));
        svc.add_account(new_account("dup", "THB", dec!(1))).unwrap();
        assert!(matches!(
            svc.add_account(new_account("dup", "THB", dec!(1))),
            Err(Error::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_update_account_balance_changes_allocation() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        svc.add_investment(new_investment("etf", dec!(50), &["cash"]))
            .unwrap();
        assert_eq!(
            svc.recompute().unwrap().get("etf").unwrap().amount_for("cash"),
            dec!(50)
        );

        svc.update_account(AccountUpdate {
            id: "cash".to_string(),
            balance: Some(dec!(300)),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            svc.recompute().unwrap().get("etf").unwrap().amount_for("cash"),
            dec!(150)
        );
    }

    #[test]
    fn test_remove_account_prunes_priority_lists() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("a", "THB", dec!(100))).unwrap();
        svc.add_account(new_account("b", "USD", dec!(10))).unwrap();
        svc.add_investment(new_investment("etf", dec!(10), &["a", "b"]))
            .unwrap();

        svc.remove_account("a").unwrap();
        let snapshot = svc.snapshot().unwrap();
        assert_eq!(snapshot.investments[0].account_priority, vec!["b"]);
        assert!(matches!(
            svc.remove_account("a"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_investment_references_are_checked() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        assert!(matches!(
            svc.add_investment(new_investment("etf", dec!(10), &["ghost"])),
            Err(Error::NotFound { entity: "Account", .. })
        ));

        let mut grouped = new_investment("etf", dec!(10), &["cash"]);
        grouped.group_id = Some("missing".to_string());
        assert!(matches!(
            svc.add_investment(grouped),
            Err(Error::NotFound { entity: "Group", .. })
        ));
    }

    #[test]
    fn test_group_cycle_is_rejected_on_update() {
        let svc = service(MockPlanRepository::default());
        svc.add_group(new_group("a", dec!(50), None)).unwrap();
        svc.add_group(new_group("b", dec!(50), Some("a"))).unwrap();
        svc.add_group(new_group("c", dec!(50), Some("b"))).unwrap();

        let result = svc.update_group(GroupUpdate {
            id: "a".to_string(),
            parent_id: Some(Some("c".to_string())),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::GroupCycle(_))));
        // State is untouched after a rejected update
        assert_eq!(svc.snapshot().unwrap().group("a").unwrap().parent_id, None);

        let self_parent = svc.update_group(GroupUpdate {
            id: "b".to_string(),
            parent_id: Some(Some("b".to_string())),
            ..Default::default()
        });
        assert!(matches!(self_parent, Err(Error::GroupCycle(_))));
    }

    #[test]
    fn test_group_defaults_and_removal_constraints() {
        let svc = service(MockPlanRepository::default());
        let mut root = new_group("root", dec!(60), None);
        root.percentage = None;
        let root = svc.add_group(root).unwrap();
        assert_eq!(root.percentage, dec!(100));

        svc.add_group(new_group("child", dec!(50), Some("root"))).unwrap();
        assert!(matches!(
            svc.remove_group("root"),
            Err(Error::ConstraintViolation(_))
        ));

        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        let mut grouped = new_investment("etf", dec!(10), &["cash"]);
        grouped.group_id = Some("child".to_string());
        svc.add_investment(grouped).unwrap();
        assert!(matches!(
            svc.remove_group("child"),
            Err(Error::ConstraintViolation(_))
        ));

        svc.update_investment(InvestmentUpdate {
            id: "etf".to_string(),
            group_id: Some(None),
            ..Default::default()
        })
        .unwrap();
        svc.remove_group("child").unwrap();
        svc.remove_group("root").unwrap();
        assert!(svc.snapshot().unwrap().groups.is_empty());
    }

    #[test]
    fn test_move_investment_changes_allocation_order() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        svc.add_investment(new_investment("a", dec!(100), &["cash"]))
            .unwrap();
        svc.add_investment(new_investment("b", dec!(100), &["cash"]))
            .unwrap();
        assert!(svc.recompute().unwrap().is_overspent("b"));

        svc.move_investment("b", 0).unwrap();
        let result = svc.recompute().unwrap();
        assert!(!result.is_overspent("b"));
        assert!(result.is_overspent("a"));
        assert!(svc.move_investment("b", 5).is_err());
    }

    #[test]
    fn test_exchange_rate_must_be_positive() {
        let svc = service(MockPlanRepository::default());
        assert!(matches!(
            svc.set_exchange_rate(Decimal::ZERO),
            Err(Error::InvalidExchangeRate(_))
        ));
        svc.set_exchange_rate(dec!(35.5)).unwrap();
        assert_eq!(svc.snapshot().unwrap().exchange_rate, dec!(35.5));
    }

    // ==================== Preview Tests ====================

    #[test]
    fn test_preview_sees_balances_left_by_others() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        svc.add_investment(new_investment("a", dec!(70), &["cash"]))
            .unwrap();

        let preview = svc
            .preview_investment(new_investment("new", dec!(50), &["cash"]), None)
            .unwrap();
        assert_eq!(preview.amount_for("cash"), dec!(30));
        assert!(!preview.fully_allocated);

        // Editing "a" itself ignores its current claim
        let edit = svc
            .preview_investment(new_investment("a", dec!(90), &["cash"]), Some("a"))
            .unwrap();
        assert_eq!(edit.investment_id, "a");
        assert_eq!(edit.amount_for("cash"), dec!(90));
        assert!(edit.fully_allocated);

        // Preview never mutates the plan
        assert_eq!(svc.snapshot().unwrap().investments.len(), 1);
    }

    #[test]
    fn test_preview_of_edit_keeps_later_claims_in_place() {
        let svc = service(MockPlanRepository::default());
        svc.add_account(new_account("cash", "THB", dec!(100))).unwrap();
        svc.add_investment(new_investment("a", dec!(60), &["cash"]))
            .unwrap();
        svc.add_investment(new_investment("b", dec!(60), &["cash"]))
            .unwrap();

        // "b" keeps the 40 it drew in the full pass; "a" gets its 60 back
        let edit_a = svc
            .preview_investment(new_investment("a", dec!(60), &["cash"]), Some("a"))
            .unwrap();
        assert_eq!(edit_a.amount_for("cash"), dec!(60));
        assert!(edit_a.fully_allocated);

        let edit_b = svc
            .preview_investment(new_investment("b", dec!(60), &["cash"]), Some("b"))
            .unwrap();
        assert_eq!(edit_b.amount_for("cash"), dec!(40));
        assert!(!edit_b.fully_allocated);

        assert!(matches!(
            svc.preview_investment(new_investment("x", dec!(1), &["cash"]), Some("missing")),
            Err(Error::NotFound { .. })
        ));
    }

    // ==================== Schedule Tests ====================

    #[test]
    fn test_toggle_and_count() {
        let svc = service(MockPlanRepository::default());
        svc.add_investment(new_investment("etf", dec!(10), &[]))
            .unwrap();

        assert_eq!(
            svc.completion_count("etf").unwrap(),
            CompletionCount {
                completed: 0,
                total: 12
            }
        );
        assert!(svc.toggle_completion("etf", d(2024, 2, 1)).unwrap());
        assert_eq!(svc.completion_count("etf").unwrap().completed, 1);
        assert!(!svc.toggle_completion("etf", d(2024, 2, 1)).unwrap());
        assert_eq!(svc.completion_count("etf").unwrap().completed, 0);

        assert!(matches!(
            svc.toggle_completion("nope", d(2024, 2, 1)),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_update_keeps_history() {
        let svc = service(MockPlanRepository::default());
        svc.add_investment(new_investment("etf", dec!(10), &[]))
            .unwrap();
        svc.toggle_completion("etf", d(2024, 1, 1)).unwrap();

        let updated = svc
            .update_investment(InvestmentUpdate {
                id: "etf".to_string(),
                recurrence: Some(Recurrence::new(RecurrenceType::Monthly, d(2024, 1, 1))),
                ..Default::default()
            })
            .unwrap();
        assert!(updated.history.is_completed(d(2024, 1, 1)));

        let schedule = svc.schedule("etf").unwrap();
        assert_eq!(schedule.len(), 2);
        assert!(schedule[0].completed);
        assert!(!schedule[1].completed);
    }

    // ==================== Persistence Tests ====================

    #[tokio::test]
    async fn test_load_empty_repository_starts_fresh_without_saving() {
        let repo = MockPlanRepository::default();
        let svc = service(repo.clone());
        svc.load().await.unwrap();

        assert_eq!(svc.snapshot().unwrap(), PlanSnapshot::default());
        assert!(!svc.save_if_changed().await.unwrap());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_save_only_when_changed() {
        let mut stored = PlanSnapshot::default();
        stored.exchange_rate = dec!(34);
        let repo = MockPlanRepository::with_plan(stored);
        let svc = service(repo.clone());
        svc.load().await.unwrap();
        assert_eq!(svc.snapshot().unwrap().exchange_rate, dec!(34));

        svc.add_account(new_account("cash", "THB", dec!(10))).unwrap();
        assert!(svc.save_if_changed().await.unwrap());
        assert!(!svc.save_if_changed().await.unwrap());
        assert_eq!(repo.save_count(), 1);

        let persisted = repo.load_plan().await.unwrap().unwrap();
        assert_eq!(persisted.accounts.len(), 1);
    }

    #[tokio::test]
    async fn test_remote_snapshot_is_not_echoed() {
        let repo = MockPlanRepository::default();
        let svc = service(repo.clone());
        svc.load().await.unwrap();

        let mut remote = PlanSnapshot::default();
        remote.exchange_rate = dec!(31);
        svc.apply_remote_snapshot(remote.clone()).unwrap();

        assert_eq!(svc.snapshot().unwrap(), remote);
        assert!(!svc.save_if_changed().await.unwrap());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_save_is_retried_next_time() {
        let svc = PlanService::new(Arc::new(FailingRepository), PlannerSettings::default());
        svc.load().await.unwrap();
        svc.set_exchange_rate(dec!(30)).unwrap();

        assert!(matches!(
            svc.save_if_changed().await,
            Err(Error::Repository(_))
        ));
        // Still dirty, so the next attempt tries again
        assert!(svc.save_if_changed().await.is_err());
    }

    #[tokio::test]
    async fn test_remote_snapshot_during_save_is_not_echoed() {
        let remote = PlanSnapshot::with_exchange_rate(dec!(31));
        let repo = Arc::new(RemoteUpdateDuringSave {
            service: Mutex::new(None),
            remote: remote.clone(),
            saved: Mutex::new(Vec::new()),
        });
        let svc = Arc::new(PlanService::new(repo.clone(), PlannerSettings::default()));
        *repo.service.lock().unwrap() = Some(Arc::downgrade(&svc));
        svc.load().await.unwrap();

        svc.set_exchange_rate(dec!(30)).unwrap();
        assert!(svc.save_if_changed().await.unwrap());
        assert_eq!(svc.snapshot().unwrap(), remote);

        // The remote state is already stored, so nothing is written back
        assert!(!svc.save_if_changed().await.unwrap());
        let saved = repo.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].exchange_rate, dec!(30));
    }

    #[tokio::test]
    async fn test_each_local_change_is_saved() {
        let repo = MockPlanRepository::default();
        let svc = service(repo.clone());
        svc.load().await.unwrap();

        svc.set_exchange_rate(dec!(30)).unwrap();
        assert!(svc.save_if_changed().await.unwrap());
        svc.set_exchange_rate(dec!(29)).unwrap();
        assert!(svc.save_if_changed().await.unwrap());
        assert_eq!(repo.save_count(), 2);
        assert_eq!(repo.load_plan().await.unwrap().unwrap().exchange_rate, dec!(29));
    }
}
