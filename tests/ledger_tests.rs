// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use finwise::db::init_schema;
use finwise::ledger::{self, DepositOutcome};
use finwise::models::{BudgetPeriod, Profile, TxKind};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use std::str::FromStr;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    ledger::get_or_create_user(&conn, 1, &profile("Olena")).unwrap();
    conn
}

fn profile(name: &str) -> Profile {
    Profile {
        first_name: name.into(),
        ..Profile::default()
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn day(y: i32, m: u32, dd: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, dd)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn user_creation_is_idempotent_and_refreshes_activity() {
    let conn = setup();
    conn.execute(
        "UPDATE users SET last_activity='2020-01-01 00:00:00' WHERE id=1",
        [],
    )
    .unwrap();

    let again = ledger::get_or_create_user(
        &conn,
        1,
        &Profile {
            username: Some("olena_k".into()),
            ..profile("Olena")
        },
    )
    .unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(again.username.as_deref(), Some("olena_k"));
    assert_eq!(again.currency, "UAH");
    assert!(again.budget_alerts);
    assert!(again.last_activity > day(2020, 1, 2));
    assert!(again.registration_date <= again.last_activity);
}

#[test]
fn balance_is_income_minus_expense_minus_savings() {
    let mut conn = setup();
    ledger::add_transaction(&conn, 1, d("1000"), TxKind::Income, "Зарплата", None).unwrap();
    ledger::add_transaction(&conn, 1, d("150.50"), TxKind::Expense, "їжа", Some("обід"))
        .unwrap();
    let goal = ledger::create_goal(&conn, 1, "Ноутбук", d("500"), 5, None).unwrap();
    ledger::deposit(&mut conn, 1, goal.id, d("100")).unwrap();

    let bal = ledger::get_balance(&conn, 1).unwrap();
    assert_eq!(bal.income, d("1000"));
    assert_eq!(bal.expense, d("150.50"));
    assert_eq!(bal.saved, d("100"));
    assert_eq!(bal.total().unwrap(), d("749.50"));
}

#[test]
fn categories_are_case_folded_and_history_is_newest_first() {
    let conn = setup();
    ledger::add_transaction_at(&conn, 1, d("10"), TxKind::Expense, " Кава ", None, day(2025, 3, 1))
        .unwrap();
    ledger::add_transaction_at(&conn, 1, d("20"), TxKind::Expense, "таксі", None, day(2025, 3, 2))
        .unwrap();

    let txs = ledger::get_transactions(&conn, 1, 10).unwrap();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].category, "таксі");
    assert_eq!(txs[1].category, "кава");

    let recent = ledger::recent_categories(&conn, 1, TxKind::Expense, 5).unwrap();
    assert_eq!(recent, vec!["таксі".to_string(), "кава".to_string()]);
}

#[test]
fn transactions_need_an_existing_user() {
    let conn = setup();
    let err = ledger::add_transaction(&conn, 999, d("5"), TxKind::Expense, "їжа", None);
    assert!(err.is_err());
}

#[test]
fn budget_upsert_keeps_one_row_per_category() {
    let conn = setup();
    ledger::upsert_budget(&conn, 1, "Їжа", d("3000"), BudgetPeriod::Monthly).unwrap();
    let b = ledger::upsert_budget(&conn, 1, "їжа", d("3500"), BudgetPeriod::Monthly).unwrap();
    assert_eq!(b.limit, d("3500"));

    let budgets = ledger::list_budgets(&conn, 1).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].category, "їжа");
    assert_eq!(budgets[0].limit, d("3500"));
}

#[test]
fn budget_status_counts_only_current_month_expenses() {
    let conn = setup();
    ledger::upsert_budget(&conn, 1, "їжа", d("1000"), BudgetPeriod::Monthly).unwrap();
    ledger::add_transaction_at(&conn, 1, d("400"), TxKind::Expense, "їжа", None, day(2025, 8, 3))
        .unwrap();
    ledger::add_transaction_at(&conn, 1, d("500"), TxKind::Expense, "їжа", None, day(2025, 8, 20))
        .unwrap();
    // previous month and income do not count
    ledger::add_transaction_at(&conn, 1, d("900"), TxKind::Expense, "їжа", None, day(2025, 7, 30))
        .unwrap();
    ledger::add_transaction_at(&conn, 1, d("900"), TxKind::Income, "їжа", None, day(2025, 8, 5))
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 8, 25).unwrap();
    let status = ledger::budget_status(&conn, 1, today).unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].spent, d("900"));
    assert_eq!(status[0].used_pct(), d("90"));
    assert!(!status[0].is_exceeded());
}

#[test]
fn deposits_accumulate_and_record_transactions() {
    let mut conn = setup();
    let goal = ledger::create_goal(&conn, 1, "Відпустка", d("10000"), 10, Some("море")).unwrap();
    assert_eq!(goal.monthly_installment(), d("1000"));

    ledger::deposit(&mut conn, 1, goal.id, d("1500")).unwrap();
    let out = ledger::deposit(&mut conn, 1, goal.id, d("2500")).unwrap();
    match out {
        DepositOutcome::Credited { goal, credited, overflow } => {
            assert_eq!(goal.current_amount, d("4000"));
            assert_eq!(goal.deposits, d("4000"));
            assert_eq!(credited, d("2500"));
            assert!(overflow.is_zero());
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    let kinds: Vec<String> = {
        let mut stmt = conn
            .prepare("SELECT type FROM transactions WHERE user_id=?1")
            .unwrap();
        stmt.query_map(params![1], |r| r.get::<_, String>(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    };
    assert_eq!(kinds, vec!["goal_deposit", "goal_deposit"]);
}

#[test]
fn deposit_is_capped_at_target() {
    let mut conn = setup();
    let goal = ledger::create_goal(&conn, 1, "Ноутбук", d("25000"), 6, None).unwrap();
    ledger::deposit(&mut conn, 1, goal.id, d("20000")).unwrap();

    match ledger::deposit(&mut conn, 1, goal.id, d("10000")).unwrap() {
        DepositOutcome::Credited { goal, credited, overflow } => {
            assert_eq!(credited, d("5000"));
            assert_eq!(overflow, d("5000"));
            assert_eq!(goal.current_amount, d("25000"));
            assert!(goal.is_reached());
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(matches!(
        ledger::deposit(&mut conn, 1, goal.id, d("1")).unwrap(),
        DepositOutcome::AlreadyReached(_)
    ));
    assert_eq!(ledger::get_balance(&conn, 1).unwrap().saved, d("25000"));
}

#[test]
fn goals_of_other_users_are_invisible() {
    let mut conn = setup();
    ledger::get_or_create_user(&conn, 2, &profile("Taras")).unwrap();
    let goal = ledger::create_goal(&conn, 2, "Авто", d("100000"), 24, None).unwrap();

    assert!(matches!(
        ledger::deposit(&mut conn, 1, goal.id, d("10")).unwrap(),
        DepositOutcome::NotFound
    ));
    assert_eq!(ledger::delete_goal(&conn, 1, goal.id).unwrap(), None);
    assert_eq!(
        ledger::delete_goal(&conn, 2, goal.id).unwrap().as_deref(),
        Some("Авто")
    );
    assert!(ledger::list_goals(&conn, 2).unwrap().is_empty());
}

#[test]
fn settings_change_currency_and_alerts() {
    let conn = setup();
    assert!(ledger::set_currency(&conn, 1, "EUR").unwrap());
    assert!(!ledger::toggle_budget_alerts(&conn, 1).unwrap());
    assert!(ledger::toggle_budget_alerts(&conn, 1).unwrap());
    let user = ledger::get_user(&conn, 1).unwrap().unwrap();
    assert_eq!(user.currency, "EUR");
    assert!(user.budget_alerts);
}

#[test]
fn oversized_stored_amounts_fail_instead_of_panicking() {
    let conn = setup();
    for _ in 0..2 {
        ledger::add_transaction(&conn, 1, Decimal::MAX, TxKind::Expense, "їжа", None).unwrap();
    }
    assert!(ledger::get_balance(&conn, 1).is_err());

    ledger::upsert_budget(&conn, 1, "їжа", d("0.01"), BudgetPeriod::Monthly).unwrap();
    let today = finwise::utils::now().date();
    assert!(ledger::budget_status(&conn, 1, today).is_err());
}

#[test]
fn weekly_limits_count_only_the_current_week() {
    let conn = setup();
    ledger::upsert_budget(&conn, 1, "кава", d("500"), BudgetPeriod::Weekly).unwrap();
    // Monday 4th .. Sunday 10th of August 2025
    ledger::add_transaction_at(&conn, 1, d("200"), TxKind::Expense, "кава", None, day(2025, 8, 4))
        .unwrap();
    ledger::add_transaction_at(&conn, 1, d("350"), TxKind::Expense, "кава", None, day(2025, 8, 7))
        .unwrap();
    ledger::add_transaction_at(&conn, 1, d("999"), TxKind::Expense, "кава", None, day(2025, 8, 3))
        .unwrap();

    let today = NaiveDate::from_ymd_opt(2025, 8, 8).unwrap();
    let status = ledger::budget_status(&conn, 1, today).unwrap();
    assert_eq!(status[0].budget.period, BudgetPeriod::Weekly);
    assert_eq!(status[0].spent, d("550"));
    assert!(status[0].is_exceeded());
}

#[test]
fn balance_total_reports_overflow() {
    let bal = finwise::models::Balance {
        income: Decimal::MAX,
        expense: Decimal::MIN,
        saved: Decimal::ZERO,
    };
    assert!(bal.total().is_err());
}
