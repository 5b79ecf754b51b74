// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use finwise::advice::{AdviceError, Advisor, MSG_UNAVAILABLE};
use finwise::conversation::menus::{self, Keyboard};
use finwise::conversation::sessions::{MemorySessions, SessionStore, SqliteSessions};
use finwise::conversation::{
    BudgetStep, Controller, GoalStep, Incoming, MSG_CANCELLED, MSG_FAILURE, Reply, State, TxStep,
};
use finwise::db::init_schema;
use finwise::ledger;
use finwise::models::{BudgetPeriod, Profile, TxKind};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

const USER: i64 = 7;

/// Counts calls and answers from a script.
struct FakeAdvisor {
    calls: Rc<Cell<usize>>,
    questions: Rc<RefCell<Vec<String>>>,
    fail: bool,
}

impl Advisor for FakeAdvisor {
    fn ask(&self, question: &str) -> Result<String, AdviceError> {
        self.calls.set(self.calls.get() + 1);
        self.questions.borrow_mut().push(question.to_string());
        if self.fail {
            return Err(AdviceError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok("Відкладайте 10% доходу.".into())
    }
}

struct Harness<S: SessionStore> {
    bot: Controller<S>,
    calls: Rc<Cell<usize>>,
    questions: Rc<RefCell<Vec<String>>>,
}

impl<S: SessionStore> Harness<S> {
    fn say(&mut self, text: &str) -> Reply {
        self.bot.handle(&Incoming {
            user_id: USER,
            profile: Profile {
                first_name: "Olena".into(),
                ..Profile::default()
            },
            text: text.into(),
        })
    }

    fn state(&mut self) -> State {
        self.bot.state_of(USER)
    }
}

fn harness_with(fail: bool) -> Harness<MemorySessions> {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let calls = Rc::new(Cell::new(0));
    let questions = Rc::new(RefCell::new(Vec::new()));
    let advisor = FakeAdvisor {
        calls: calls.clone(),
        questions: questions.clone(),
        fail,
    };
    Harness {
        bot: Controller::new(conn, MemorySessions::new(), Box::new(advisor)),
        calls,
        questions,
    }
}

fn harness() -> Harness<MemorySessions> {
    harness_with(false)
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[test]
fn start_registers_user_and_shows_main_menu() {
    let mut h = harness();
    let reply = h.say("/start");
    assert!(reply.text.contains("Olena"));
    assert_eq!(reply.keyboard, Some(Keyboard::Main));
    assert!(ledger::get_user(h.bot.conn(), USER).unwrap().is_some());
    assert_eq!(h.state(), State::Idle);
}

#[test]
fn expense_form_rejects_bad_amount_then_records() {
    let mut h = harness();
    h.say(menus::BTN_TRANSACTION);
    assert_eq!(h.state(), State::Transaction(TxStep::Kind));
    h.say(menus::BTN_EXPENSE);

    let reply = h.say("abc");
    assert!(reply.text.contains("Невірний формат"));
    assert_eq!(
        h.state(),
        State::Transaction(TxStep::Amount {
            kind: TxKind::Expense
        })
    );
    assert!(ledger::get_transactions(h.bot.conn(), USER, 10).unwrap().is_empty());

    let reply = h.say("-5");
    assert!(reply.text.contains("більшою за нуль"));

    h.say("150,50");
    h.say("Їжа");
    let reply = h.say(menus::BTN_SKIP);
    assert!(reply.text.contains("150.50 грн"));
    assert_eq!(reply.keyboard, Some(Keyboard::Main));
    assert_eq!(h.state(), State::Idle);

    let txs = ledger::get_transactions(h.bot.conn(), USER, 10).unwrap();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, d("150.50"));
    assert_eq!(txs[0].category, "їжа");
    assert_eq!(txs[0].description, None);
    assert_eq!(ledger::get_balance(h.bot.conn(), USER).unwrap().total().unwrap(), d("-150.50"));
}

#[test]
fn income_with_description() {
    let mut h = harness();
    h.say("/add");
    h.say(menus::BTN_INCOME);
    h.say("20000");
    h.say("зарплата");
    h.say("аванс за серпень");
    let txs = ledger::get_transactions(h.bot.conn(), USER, 10).unwrap();
    assert_eq!(txs[0].kind, TxKind::Income);
    assert_eq!(txs[0].description.as_deref(), Some("аванс за серпень"));
}

#[test]
fn cancel_clears_draft_from_any_step() {
    let mut h = harness();
    h.say("/transaction");
    h.say(menus::BTN_EXPENSE);
    h.say("99");
    let reply = h.say(menus::BTN_CANCEL);
    assert_eq!(reply.text, MSG_CANCELLED);
    assert_eq!(h.state(), State::Idle);
    assert!(h.bot.sessions().is_empty());
    assert!(ledger::get_transactions(h.bot.conn(), USER, 10).unwrap().is_empty());
}

#[test]
fn setting_a_limit_twice_keeps_one_budget() {
    let mut h = harness();
    h.say(menus::BTN_BUDGET);
    h.say(menus::BTN_BUDGET_SETTINGS);
    let first = h.say("їжа 3000");
    assert!(first.text.contains("3000.00 грн"));
    assert_eq!(h.state(), State::Budget(BudgetStep::SettingLimit));
    h.say("Їжа 3500");

    let budgets = ledger::list_budgets(h.bot.conn(), USER).unwrap();
    assert_eq!(budgets.len(), 1);
    assert_eq!(budgets[0].limit, d("3500"));

    let listed = h.say("/list");
    assert!(listed.text.contains("їжа: 3500"));
    assert_eq!(h.state(), State::Budget(BudgetStep::SettingLimit));
}

#[test]
fn budget_expense_warns_near_limit() {
    let mut h = harness();
    h.say("/budget");
    h.say(menus::BTN_BUDGET_SETTINGS);
    h.say("таксі 100");
    h.say("/budget");
    h.say(menus::BTN_ADD_EXPENSE);
    let reply = h.say("85 таксі");
    assert!(reply.text.contains("85%"));
    assert_eq!(h.state(), State::Budget(BudgetStep::Menu));

    h.say(menus::BTN_ADD_EXPENSE);
    let reply = h.say("20 таксі");
    assert!(reply.text.contains("перевищено"));
}

#[test]
fn goal_deposit_overflow_is_capped() {
    let mut h = harness();
    h.say(menus::BTN_GOALS);
    h.say(menus::BTN_GOAL_NEW);
    let created = h.say("Новий ноутбук 25000 6 | для навчання");
    assert!(created.text.contains("Новий ноутбук"));
    assert_eq!(h.state(), State::Goal(GoalStep::Menu));

    h.say(menus::BTN_GOAL_DEPOSIT);
    assert_eq!(h.state(), State::Goal(GoalStep::Deposit));
    h.say("1 20000");
    h.say(menus::BTN_GOAL_DEPOSIT);
    let reply = h.say("1 10000");
    assert!(reply.text.contains("5000.00 грн не зараховано"));
    assert!(reply.text.contains("Ціль досягнуто"));

    let goals = ledger::list_goals(h.bot.conn(), USER).unwrap();
    assert_eq!(goals[0].current_amount, d("25000"));
    assert_eq!(goals[0].description.as_deref(), Some("для навчання"));
    assert_eq!(ledger::get_balance(h.bot.conn(), USER).unwrap().saved, d("25000"));
}

#[test]
fn goal_deposit_with_unknown_number_reprompts() {
    let mut h = harness();
    h.say("/goals");
    h.say(menus::BTN_GOAL_NEW);
    h.say("Авто 100000 24");
    h.say(menus::BTN_GOAL_DEPOSIT);
    let reply = h.say("5 100");
    assert!(reply.text.contains("номер цілі"));
    assert_eq!(h.state(), State::Goal(GoalStep::Deposit));

    h.say("/goals");
    h.say(menus::BTN_GOAL_DELETE);
    h.say("1");
    assert!(ledger::list_goals(h.bot.conn(), USER).unwrap().is_empty());
}

#[test]
fn short_question_does_not_reach_advisor() {
    let mut h = harness();
    h.say(menus::BTN_ADVICE);
    assert_eq!(h.state(), State::Advice);

    let reply = h.say("ok");
    assert!(reply.text.contains("не менше 3 символів"));
    assert_eq!(h.calls.get(), 0);

    let reply = h.say("Як заощадити на їжі?");
    assert_eq!(h.calls.get(), 1);
    assert!(reply.text.starts_with("🤖 FinWise Owl AI:"));
    assert!(reply.text.contains("10% доходу"));
    assert_eq!(h.state(), State::Advice);
}

#[test]
fn inline_advice_question_is_answered_at_once() {
    let mut h = harness();
    h.say("/advice чи варто брати кредит?");
    assert_eq!(h.calls.get(), 1);
    assert_eq!(h.questions.borrow()[0], "чи варто брати кредит?");
}

#[test]
fn advisor_failure_becomes_apology() {
    let mut h = harness_with(true);
    h.say("/ask");
    let reply = h.say("Що робити з боргами?");
    assert!(reply.text.contains(MSG_UNAVAILABLE));
    assert_eq!(h.state(), State::Advice);
}

#[test]
fn analytics_chart_needs_two_months() {
    let mut h = harness();
    h.say(menus::BTN_ANALYTICS);
    let reply = h.say(menus::BTN_CHART);
    assert!(reply.text.contains("Недостатньо даних"));
    assert_eq!(h.state(), State::Analytics);
}

#[test]
fn settings_currency_and_export() {
    let mut h = harness();
    h.say("/add");
    h.say(menus::BTN_EXPENSE);
    h.say("42");
    h.say("кава");
    h.say("-");

    h.say(menus::BTN_SETTINGS);
    h.say(menus::BTN_CURRENCY);
    let bad = h.say("JPY");
    assert!(bad.text.contains("Невідома валюта"));
    h.say("usd");
    assert_eq!(ledger::get_user(h.bot.conn(), USER).unwrap().unwrap().currency, "USD");

    let reply = h.say(menus::BTN_EXPORT);
    let doc = reply.document.expect("export attaches a document");
    let csv = String::from_utf8(doc.bytes).unwrap();
    assert!(csv.starts_with("date,type,amount,category,description"));
    assert!(csv.contains("expense,42,кава"));

    let balance = h.say("/balance");
    assert!(balance.text.contains("$"));
}

#[test]
fn unknown_text_when_idle_points_to_menu() {
    let mut h = harness();
    let reply = h.say("привіт");
    assert!(reply.text.contains("/help"));
    assert_eq!(reply.keyboard, Some(Keyboard::Main));
}

#[test]
fn sqlite_sessions_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.sqlite");

    let mut store = SqliteSessions::open(&path).unwrap();
    let state = State::Transaction(TxStep::Category {
        kind: TxKind::Expense,
        amount: d("12.5"),
    });
    store.save(USER, &state).unwrap();
    drop(store);

    let mut reopened = SqliteSessions::open(&path).unwrap();
    assert_eq!(reopened.load(USER).unwrap(), state);
    reopened.save(USER, &State::Idle).unwrap();
    assert_eq!(reopened.load(USER).unwrap(), State::Idle);
}

#[test]
fn first_expense_fills_the_monthly_report() {
    let mut h = harness();
    h.say("/start");
    h.say(menus::BTN_TRANSACTION);
    h.say("Витрата");
    h.say("150");
    h.say("їжа");
    h.say("пропустити");
    assert_eq!(ledger::get_balance(h.bot.conn(), USER).unwrap().total().unwrap(), d("-150"));

    h.say(menus::BTN_ANALYTICS);
    let report = h.say(menus::BTN_MONTH);
    assert!(report.html);
    assert!(report.text.contains("▪ Їжа: 150.00 грн (100.0%)"));
}

#[test]
fn single_oversized_deposit_fills_the_goal() {
    let mut h = harness();
    h.say("/goals");
    h.say(menus::BTN_GOAL_NEW);
    h.say("Ноутбук 25000 6");
    h.say(menus::BTN_GOAL_DEPOSIT);
    let reply = h.say("1 30000");
    assert!(reply.text.contains("не зараховано"));
    let goals = ledger::list_goals(h.bot.conn(), USER).unwrap();
    assert_eq!(goals[0].current_amount, d("25000"));

    h.say(menus::BTN_GOAL_DEPOSIT);
    let reply = h.say("1 100");
    assert!(reply.text.contains("вже досягнуто"));
}

#[test]
fn resetting_a_limit_lists_the_latest_value() {
    let mut h = harness();
    h.say("/budget");
    h.say(menus::BTN_BUDGET_SETTINGS);
    h.say("їжа 3000");
    h.say("їжа 4000");
    let listed = h.say("/list");
    assert_eq!(listed.text.matches("їжа:").count(), 1);
    assert!(listed.text.contains("їжа: 4000"));
}

#[test]
fn amounts_beyond_the_cap_are_reprompted() {
    let mut h = harness();
    for _ in 0..2 {
        h.say("/transaction");
        h.say(menus::BTN_INCOME);
        let reply = h.say("79228162514264337593543950335");
        assert!(reply.text.contains("не може перевищувати"));
        assert_eq!(
            h.state(),
            State::Transaction(TxStep::Amount {
                kind: TxKind::Income
            })
        );
        h.say("/cancel");
    }
    assert!(ledger::get_transactions(h.bot.conn(), USER, 10).unwrap().is_empty());

    h.say("/transaction");
    h.say(menus::BTN_INCOME);
    h.say("1000000000000");
    h.say("зарплата");
    h.say(menus::BTN_SKIP);
    let reply = h.say("/balance");
    assert!(reply.text.contains("1000000000000.00 грн"));
}

#[test]
fn storage_failure_keeps_the_transaction_draft() {
    let mut h = harness();
    h.say("/transaction");
    h.say(menus::BTN_EXPENSE);
    h.bot
        .conn()
        .execute_batch("ALTER TABLE transactions RENAME TO transactions_moved")
        .unwrap();

    let reply = h.say("150");
    assert_eq!(reply.text, MSG_FAILURE);
    assert_eq!(reply.keyboard, Some(Keyboard::Cancel));
    let draft = State::Transaction(TxStep::Amount {
        kind: TxKind::Expense,
    });
    assert_eq!(h.state(), draft);

    h.bot
        .conn()
        .execute_batch("ALTER TABLE transactions_moved RENAME TO transactions")
        .unwrap();
    h.say("150");
    assert_eq!(
        h.state(),
        State::Transaction(TxStep::Category {
            kind: TxKind::Expense,
            amount: d("150")
        })
    );
}

#[test]
fn storage_failure_keeps_the_goal_menu() {
    let mut h = harness();
    h.say("/goals");
    h.bot
        .conn()
        .execute_batch("ALTER TABLE goals RENAME TO goals_moved")
        .unwrap();
    let reply = h.say(menus::BTN_GOAL_LIST);
    assert_eq!(reply.text, MSG_FAILURE);
    assert_eq!(reply.keyboard, Some(Keyboard::Goals));
    assert_eq!(h.state(), State::Goal(GoalStep::Menu));
}

#[test]
fn listing_limits_keeps_the_section_keyboard() {
    let mut h = harness();
    h.say("/goals");
    let listed = h.say("/list");
    assert!(listed.text.contains("немає встановлених лімітів"));
    assert_eq!(listed.keyboard, Some(Keyboard::Goals));
    assert_eq!(h.state(), State::Goal(GoalStep::Menu));

    h.say("/analytics");
    assert_eq!(h.say("/list").keyboard, Some(Keyboard::Analytics));
    h.say("/settings");
    assert_eq!(h.say("/list").keyboard, Some(Keyboard::Settings));
}

#[test]
fn weekly_limit_can_be_set_from_the_chat() {
    let mut h = harness();
    h.say("/budget");
    h.say(menus::BTN_BUDGET_SETTINGS);
    let reply = h.say("кава 500 тиждень");
    assert!(reply.text.contains("500.00 грн на тиждень"));

    let budgets = ledger::list_budgets(h.bot.conn(), USER).unwrap();
    assert_eq!(budgets[0].period, BudgetPeriod::Weekly);
    assert!(h.say("/list").text.contains("кава: 500 на тиждень"));

    let reply = h.say("кава 0,0000000000000000000000001");
    assert!(reply.text.contains("Невірний формат"));
    assert_eq!(ledger::list_budgets(h.bot.conn(), USER).unwrap()[0].limit, d("500"));
}
