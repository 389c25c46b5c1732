use crate::core::models::{
    attendance::{AttendanceRecordRow, AttendanceSession, Occasion, PresenceCount, Upsert as AttendanceUpsert},
    branch::{Branch, Query as BranchQuery},
    common::{ListQuery, Order, Pagination, UpdateScope},
    expense::{Expense, ExpenseUpdate, Insert as ExpenseInsert},
    filter::{Predicate, Value},
    group::{GroupMemberRow, GroupRow, GroupUpdate, Insert as GroupInsert},
    income::{IncomeRow, IncomeUpdate, Insert as IncomeInsert},
    pledge::{Insert as PledgeInsert, PaymentInsert, PledgePayment, PledgeRow, PledgeUpdate},
    summary::CategoryTotal,
};
use crate::core::ports::repository::{AttendanceCommon, BranchCommon, Common, ExpenseCommon, GroupCommon, IncomeCommon, PledgeCommon, Store, TxStore};
use crate::error::Error;
use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, query_scalar, Executor, PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

const INCOME_FROM: &str = "
    FROM income AS i
    LEFT JOIN branches AS b ON b.id = i.branch_id
    LEFT JOIN members AS m ON m.id = i.member_id
    LEFT JOIN groups AS g ON g.id = i.group_id
    LEFT JOIN tag_items AS t ON t.id = i.tag_item_id";

const INCOME_SELECT: &str = "
    SELECT
        i.id, i.organization_id, i.branch_id, b.name AS branch_name, i.amount, i.date, i.category,
        i.payment_method, i.description, i.receipt_number, i.member_id, i.group_id, i.tag_item_id,
        i.occasion_id, i.session_id, i.is_deleted, i.created_by, i.created_at, i.source_type, i.source,
        m.first_name AS member_first_name, m.last_name AS member_last_name, m.avatar_url AS member_avatar_url,
        g.name AS group_name, t.name AS tag_item_name, t.color AS tag_item_color";

const EXPENSE_FROM: &str = "
    FROM expenses AS e
    LEFT JOIN branches AS b ON b.id = e.branch_id";

const EXPENSE_SELECT: &str = "
    SELECT
        e.id, e.organization_id, e.branch_id, b.name AS branch_name, e.amount, e.date, e.category,
        e.payment_method, e.description, e.vendor, e.receipt_number, e.is_deleted, e.created_by, e.created_at";

const PLEDGE_FROM: &str = "
    FROM pledge_records AS p
    LEFT JOIN (
        SELECT pledge_id, SUM(amount) AS amount_paid, COUNT(*) AS payment_count
        FROM pledge_payments
        WHERE is_deleted = FALSE
        GROUP BY pledge_id
    ) AS pp ON pp.pledge_id = p.id
    LEFT JOIN branches AS b ON b.id = p.branch_id
    LEFT JOIN members AS m ON m.id = p.member_id
    LEFT JOIN groups AS g ON g.id = p.group_id
    LEFT JOIN tag_items AS t ON t.id = p.tag_item_id";

const PLEDGE_SELECT: &str = "
    SELECT
        p.id, p.organization_id, p.branch_id, b.name AS branch_name, p.pledge_amount, p.pledge_date,
        p.due_date, p.purpose, p.description, p.member_id, p.group_id, p.tag_item_id, p.is_deleted,
        p.created_by, p.created_at, p.source_type, p.source,
        COALESCE(pp.amount_paid, 0) AS amount_paid, COALESCE(pp.payment_count, 0) AS payment_count,
        m.first_name AS member_first_name, m.last_name AS member_last_name, m.avatar_url AS member_avatar_url,
        g.name AS group_name, t.name AS tag_item_name, t.color AS tag_item_color";

const ATTENDANCE_FROM: &str = "
    FROM attendance_records AS ar
    LEFT JOIN members AS m ON m.id = ar.member_id
    LEFT JOIN occasions AS o ON o.id = ar.occasion_id
    LEFT JOIN attendance_sessions AS s ON s.id = ar.session_id";

const ATTENDANCE_SELECT: &str = "
    SELECT
        ar.id, ar.organization_id, ar.branch_id, ar.occasion_id, ar.session_id, ar.member_id, ar.present,
        ar.marked_by, ar.marking_method, ar.marked_at,
        m.first_name AS member_first_name, m.last_name AS member_last_name, m.avatar_url AS member_avatar_url,
        o.name AS occasion_name, s.name AS session_name, s.start_time AS session_start_time";

const GROUP_SELECT: &str = "
    SELECT
        g.id, g.organization_id, g.branch_id, g.name, g.description, g.type, g.is_closed, g.start_date,
        g.end_date, g.created_by, g.created_at,
        (SELECT COUNT(*) FROM member_assigned_groups AS mag WHERE mag.group_id = g.id) AS member_count";

const SESSION_COLUMNS: &str = "id, occasion_id, organization_id, branch_id, name, start_time, end_time, is_open, created_at";

fn push_value(qb: &mut QueryBuilder<'_, Postgres>, value: &Value) {
    match value {
        Value::Uuid(v) => qb.push_bind(*v),
        Value::Text(v) => qb.push_bind(v.clone()),
        Value::Decimal(v) => qb.push_bind(*v),
        Value::Date(v) => qb.push_bind(*v),
        Value::Bool(v) => qb.push_bind(*v),
    };
}

fn push_list(qb: &mut QueryBuilder<'_, Postgres>, values: &[Value]) {
    qb.push("(");
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(qb, v);
    }
    qb.push(")");
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Eq { field, value } => {
            qb.push(field).push(" = ");
            push_value(qb, value);
        }
        // an empty set matches nothing
        Predicate::In { values, .. } if values.is_empty() => {
            qb.push("FALSE");
        }
        Predicate::In { field, values } => {
            qb.push(field).push(" IN ");
            push_list(qb, values);
        }
        Predicate::Range { field, min, max } => match (min, max) {
            (Some(min), Some(max)) => {
                qb.push(field).push(" BETWEEN ");
                push_value(qb, min);
                qb.push(" AND ");
                push_value(qb, max);
            }
            (Some(min), None) => {
                qb.push(field).push(" >= ");
                push_value(qb, min);
            }
            (None, Some(max)) => {
                qb.push(field).push(" <= ");
                push_value(qb, max);
            }
            (None, None) => {
                qb.push("TRUE");
            }
        },
        Predicate::Compare { field, op, value } => {
            qb.push(field).push(" ").push(op.as_sql()).push(" ");
            push_value(qb, value);
        }
        Predicate::InOrNull { field, values } if values.is_empty() => {
            qb.push(field).push(" IS NULL");
        }
        Predicate::InOrNull { field, values } => {
            qb.push("(").push(field).push(" IS NULL OR ").push(field).push(" IN ");
            push_list(qb, values);
            qb.push(")");
        }
        Predicate::AnyIlike { fields, pattern } => {
            qb.push("(");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(field).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

/// Appends `WHERE <organization> = $n AND <predicate>...`.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, organization_field: &str, query: &ListQuery) {
    qb.push(" WHERE ").push(organization_field).push(" = ").push_bind(query.organization_id);
    for predicate in &query.predicates {
        qb.push(" AND ");
        push_predicate(qb, predicate);
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[Order]) {
    for (i, o) in order.iter().enumerate() {
        qb.push(if i == 0 { " ORDER BY " } else { ", " });
        qb.push(o.column).push(" ").push(o.direction.as_sql());
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, pagination: Option<Pagination>) {
    if let Some(p) = pagination {
        qb.push(" LIMIT ").push_bind(p.limit());
        qb.push(" OFFSET ").push_bind(p.offset());
    }
}

fn push_update_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: &UpdateScope, id: Uuid) {
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" AND organization_id = ").push_bind(scope.organization_id);
    if let Some(created_by) = scope.created_by {
        qb.push(" AND created_by = ").push_bind(created_by);
    }
}

/// Pushes `column = $n` for every field of the update that is set.
macro_rules! push_set {
    ($qb:ident, $data:ident, $($field:ident),+ $(,)?) => {{
        let mut set = $qb.separated(", ");
        $(
            if let Some(v) = $data.$field {
                set.push(concat!(stringify!($field), " = ")).push_bind_unseparated(v);
            }
        )+
    }};
}

fn list_statement(select: &str, from: &str, organization_field: &str, query: &ListQuery, pagination: Option<Pagination>) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(select);
    qb.push(from);
    push_where(&mut qb, organization_field, query);
    push_order(&mut qb, &query.order);
    push_page(&mut qb, pagination);
    qb
}

fn count_statement(from: &str, organization_field: &str, query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
    qb.push(from);
    push_where(&mut qb, organization_field, query);
    qb
}

fn totals_statement(category: &str, amount: &str, from: &str, organization_field: &str, query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} AS category, COALESCE(SUM({}), 0) AS total, COUNT(*) AS count", category, amount));
    qb.push(from);
    push_where(&mut qb, organization_field, query);
    qb.push(" GROUP BY ").push(category);
    qb
}

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> BranchCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn query(&mut self, query: &BranchQuery) -> Result<Vec<Branch>, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, organization_id, name, address, is_active, created_at FROM branches WHERE organization_id = ");
        qb.push_bind(query.organization_id);
        if !query.include_inactive {
            qb.push(" AND is_active = TRUE");
        }
        if let Some(ids) = &query.ids {
            qb.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
        }
        qb.push(" ORDER BY name ASC");
        let branches = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(branches)
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Branch>, Error> {
        let branch = query_as("SELECT id, organization_id, name, address, is_active, created_at FROM branches WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(branch)
    }

    async fn assigned_ids(&mut self, organization_id: Uuid, user_id: Uuid) -> Result<Vec<Uuid>, Error> {
        let ids = query_scalar(
            "
        SELECT ub.branch_id
        FROM user_branches AS ub
        JOIN branches AS b ON b.id = ub.branch_id
        WHERE ub.user_id = $1 AND b.organization_id = $2 AND b.is_active = TRUE",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(ids)
    }

    async fn assign_user(&mut self, branch_id: Uuid, user_id: Uuid) -> Result<(), Error> {
        query("INSERT INTO user_branches (branch_id, user_id) VALUES ($1, $2) ON CONFLICT (branch_id, user_id) DO NOTHING")
            .bind(branch_id)
            .bind(user_id)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }
}

impl<E> IncomeCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: IncomeInsert) -> Result<Uuid, Error> {
        let IncomeInsert { organization_id, created_by, data } = data;
        let id = query_scalar(
            "
        INSERT INTO income (
            organization_id, branch_id, amount, date, category, payment_method, description, receipt_number,
            source_type, source, member_id, group_id, tag_item_id, occasion_id, session_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING id",
        )
        .bind(organization_id)
        .bind(data.branch_id)
        .bind(data.amount)
        .bind(data.date)
        .bind(data.category)
        .bind(data.payment_method)
        .bind(data.description)
        .bind(data.receipt_number)
        .bind(data.source_type)
        .bind(data.source)
        .bind(data.member_id)
        .bind(data.group_id)
        .bind(data.tag_item_id)
        .bind(data.occasion_id)
        .bind(data.session_id)
        .bind(created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<IncomeRow>, Error> {
        let mut qb = list_statement(INCOME_SELECT, INCOME_FROM, "i.organization_id", query, pagination);
        let rows = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(rows)
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        let mut qb = count_statement(INCOME_FROM, "i.organization_id", query);
        let (n,): (i64,) = qb.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error> {
        let mut qb = totals_statement("i.category", "i.amount", INCOME_FROM, "i.organization_id", query);
        let totals = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(totals)
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<IncomeRow>, Error> {
        let mut qb = QueryBuilder::<Postgres>::new(INCOME_SELECT);
        qb.push(INCOME_FROM);
        qb.push(" WHERE i.id = ").push_bind(id);
        qb.push(" AND i.organization_id = ").push_bind(organization_id);
        let row = qb.build_query_as().fetch_optional(&mut self.executor).await?;
        Ok(row)
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: IncomeUpdate) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE income SET ");
        push_set!(qb, data, amount, date, category, payment_method, description, receipt_number, source_type, source, member_id, group_id, tag_item_id, branch_id);
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE income SET is_deleted = TRUE");
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }
}

impl<E> ExpenseCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: ExpenseInsert) -> Result<Uuid, Error> {
        let ExpenseInsert { organization_id, created_by, data } = data;
        let id = query_scalar(
            "
        INSERT INTO expenses (
            organization_id, branch_id, amount, date, category, payment_method, description, vendor, receipt_number, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id",
        )
        .bind(organization_id)
        .bind(data.branch_id)
        .bind(data.amount)
        .bind(data.date)
        .bind(data.category)
        .bind(data.payment_method)
        .bind(data.description)
        .bind(data.vendor)
        .bind(data.receipt_number)
        .bind(created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<Expense>, Error> {
        let mut qb = list_statement(EXPENSE_SELECT, EXPENSE_FROM, "e.organization_id", query, pagination);
        let rows = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(rows)
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        let mut qb = count_statement(EXPENSE_FROM, "e.organization_id", query);
        let (n,): (i64,) = qb.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn category_totals(&mut self, query: &ListQuery) -> Result<Vec<CategoryTotal>, Error> {
        let mut qb = totals_statement("e.category", "e.amount", EXPENSE_FROM, "e.organization_id", query);
        let totals = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(totals)
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<Expense>, Error> {
        let mut qb = QueryBuilder::<Postgres>::new(EXPENSE_SELECT);
        qb.push(EXPENSE_FROM);
        qb.push(" WHERE e.id = ").push_bind(id);
        qb.push(" AND e.organization_id = ").push_bind(organization_id);
        let expense = qb.build_query_as().fetch_optional(&mut self.executor).await?;
        Ok(expense)
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: ExpenseUpdate) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE expenses SET ");
        push_set!(qb, data, amount, date, category, payment_method, description, vendor, receipt_number, branch_id);
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE expenses SET is_deleted = TRUE");
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }
}

impl<E> PledgeCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: PledgeInsert) -> Result<Uuid, Error> {
        let PledgeInsert { organization_id, created_by, data } = data;
        let id = query_scalar(
            "
        INSERT INTO pledge_records (
            organization_id, branch_id, pledge_amount, pledge_date, due_date, purpose, description,
            source_type, source, member_id, group_id, tag_item_id, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id",
        )
        .bind(organization_id)
        .bind(data.branch_id)
        .bind(data.pledge_amount)
        .bind(data.pledge_date)
        .bind(data.due_date)
        .bind(data.purpose)
        .bind(data.description)
        .bind(data.source_type)
        .bind(data.source)
        .bind(data.member_id)
        .bind(data.group_id)
        .bind(data.tag_item_id)
        .bind(created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<PledgeRow>, Error> {
        let mut qb = list_statement(PLEDGE_SELECT, PLEDGE_FROM, "p.organization_id", query, pagination);
        let rows = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(rows)
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        let mut qb = count_statement(PLEDGE_FROM, "p.organization_id", query);
        let (n,): (i64,) = qb.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgeRow>, Error> {
        let mut qb = QueryBuilder::<Postgres>::new(PLEDGE_SELECT);
        qb.push(PLEDGE_FROM);
        qb.push(" WHERE p.id = ").push_bind(id);
        qb.push(" AND p.organization_id = ").push_bind(organization_id);
        let row = qb.build_query_as().fetch_optional(&mut self.executor).await?;
        Ok(row)
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: PledgeUpdate) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE pledge_records SET ");
        push_set!(qb, data, pledge_amount, pledge_date, due_date, purpose, description, branch_id);
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn soft_delete(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE pledge_records SET is_deleted = TRUE");
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn insert_payment(&mut self, data: PaymentInsert) -> Result<Uuid, Error> {
        let id = query_scalar(
            "
        INSERT INTO pledge_payments (pledge_id, organization_id, amount, payment_date, payment_method, notes, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id",
        )
        .bind(data.pledge_id)
        .bind(data.organization_id)
        .bind(data.data.amount)
        .bind(data.data.payment_date)
        .bind(data.data.payment_method)
        .bind(data.data.notes)
        .bind(data.created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn payments(&mut self, organization_id: Uuid, pledge_id: Uuid) -> Result<Vec<PledgePayment>, Error> {
        let payments = query_as(
            "
        SELECT id, pledge_id, organization_id, amount, payment_date, payment_method, notes, is_deleted, created_by, created_at
        FROM pledge_payments
        WHERE organization_id = $1 AND pledge_id = $2 AND is_deleted = FALSE
        ORDER BY payment_date DESC, created_at DESC",
        )
        .bind(organization_id)
        .bind(pledge_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(payments)
    }

    async fn get_payment(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<PledgePayment>, Error> {
        let payment = query_as(
            "
        SELECT id, pledge_id, organization_id, amount, payment_date, payment_method, notes, is_deleted, created_by, created_at
        FROM pledge_payments
        WHERE id = $1 AND organization_id = $2",
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&mut self.executor)
        .await?;
        Ok(payment)
    }

    async fn soft_delete_payment(&mut self, scope: &UpdateScope, id: Uuid) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE pledge_payments SET is_deleted = TRUE");
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_deleted = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }
}

impl<E> AttendanceCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn occasions(&mut self, query: &ListQuery) -> Result<Vec<Occasion>, Error> {
        let mut qb = list_statement(
            "SELECT o.id, o.organization_id, o.branch_id, o.name, o.description, o.is_active, o.created_at",
            " FROM occasions AS o",
            "o.organization_id",
            query,
            None,
        );
        let occasions = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(occasions)
    }

    async fn sessions(&mut self, organization_id: Uuid, occasion_id: Uuid) -> Result<Vec<AttendanceSession>, Error> {
        let sessions = query_as(&format!(
            "SELECT {} FROM attendance_sessions WHERE organization_id = $1 AND occasion_id = $2 ORDER BY start_time DESC",
            SESSION_COLUMNS
        ))
        .bind(organization_id)
        .bind(occasion_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(sessions)
    }

    async fn get_session(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<AttendanceSession>, Error> {
        let session = query_as(&format!("SELECT {} FROM attendance_sessions WHERE id = $1 AND organization_id = $2", SESSION_COLUMNS))
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(session)
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<AttendanceRecordRow>, Error> {
        let mut qb = list_statement(ATTENDANCE_SELECT, ATTENDANCE_FROM, "ar.organization_id", query, pagination);
        let rows = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(rows)
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        let mut qb = count_statement(ATTENDANCE_FROM, "ar.organization_id", query);
        let (n,): (i64,) = qb.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn upsert(&mut self, record: AttendanceUpsert) -> Result<(), Error> {
        query(
            "
        INSERT INTO attendance_records (organization_id, branch_id, occasion_id, session_id, member_id, present, marked_by, marking_method)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (session_id, member_id) DO UPDATE SET
            present = EXCLUDED.present,
            marked_by = EXCLUDED.marked_by,
            marking_method = EXCLUDED.marking_method,
            marked_at = NOW()",
        )
        .bind(record.organization_id)
        .bind(record.branch_id)
        .bind(record.occasion_id)
        .bind(record.session_id)
        .bind(record.member_id)
        .bind(record.present)
        .bind(record.marked_by)
        .bind(record.marking_method.as_str())
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn presence_counts(&mut self, organization_id: Uuid, session_id: Uuid) -> Result<Vec<PresenceCount>, Error> {
        let counts = query_as("SELECT present, COUNT(*) AS count FROM attendance_records WHERE organization_id = $1 AND session_id = $2 GROUP BY present")
            .bind(organization_id)
            .bind(session_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(counts)
    }
}

impl<E> GroupCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: GroupInsert) -> Result<Uuid, Error> {
        let GroupInsert { organization_id, created_by, data } = data;
        let id = query_scalar(
            "
        INSERT INTO groups (organization_id, branch_id, name, description, type, start_date, end_date, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id",
        )
        .bind(organization_id)
        .bind(data.branch_id)
        .bind(data.name.trim().to_owned())
        .bind(data.description)
        .bind(data.type_.as_str())
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn query(&mut self, query: &ListQuery, pagination: Option<Pagination>) -> Result<Vec<GroupRow>, Error> {
        let mut qb = list_statement(GROUP_SELECT, " FROM groups AS g", "g.organization_id", query, pagination);
        let rows = qb.build_query_as().fetch_all(&mut self.executor).await?;
        Ok(rows)
    }

    async fn count(&mut self, query: &ListQuery) -> Result<i64, Error> {
        let mut qb = count_statement(" FROM groups AS g", "g.organization_id", query);
        let (n,): (i64,) = qb.build_query_as().fetch_one(&mut self.executor).await?;
        Ok(n)
    }

    async fn get(&mut self, organization_id: Uuid, id: Uuid) -> Result<Option<GroupRow>, Error> {
        let mut qb = QueryBuilder::<Postgres>::new(GROUP_SELECT);
        qb.push(" FROM groups AS g WHERE g.id = ").push_bind(id);
        qb.push(" AND g.organization_id = ").push_bind(organization_id);
        let row = qb.build_query_as().fetch_optional(&mut self.executor).await?;
        Ok(row)
    }

    async fn update(&mut self, scope: &UpdateScope, id: Uuid, data: GroupUpdate) -> Result<u64, Error> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE groups SET ");
        push_set!(qb, data, name, description, branch_id, start_date, end_date);
        push_update_scope(&mut qb, scope, id);
        qb.push(" AND is_closed = FALSE");
        let res = qb.build().execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn close(&mut self, organization_id: Uuid, id: Uuid) -> Result<u64, Error> {
        let res = query("UPDATE groups SET is_closed = TRUE WHERE id = $1 AND organization_id = $2 AND type = 'temporal' AND is_closed = FALSE")
            .bind(id)
            .bind(organization_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected())
    }

    async fn members(&mut self, group_id: Uuid) -> Result<Vec<GroupMemberRow>, Error> {
        let members = query_as(
            "
        SELECT
            mag.group_id, mag.member_id, mag.position, mag.assigned_at,
            m.first_name AS member_first_name, m.last_name AS member_last_name, m.avatar_url AS member_avatar_url
        FROM member_assigned_groups AS mag
        LEFT JOIN members AS m ON m.id = mag.member_id
        WHERE mag.group_id = $1
        ORDER BY m.first_name, m.last_name",
        )
        .bind(group_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(members)
    }

    async fn assign_member(&mut self, group_id: Uuid, member_id: Uuid, position: Option<String>) -> Result<(), Error> {
        query(
            "
        INSERT INTO member_assigned_groups (group_id, member_id, position)
        VALUES ($1, $2, $3)
        ON CONFLICT (group_id, member_id) DO UPDATE SET position = EXCLUDED.position",
        )
        .bind(group_id)
        .bind(member_id)
        .bind(position)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn remove_member(&mut self, group_id: Uuid, member_id: Uuid) -> Result<u64, Error> {
        let res = query("DELETE FROM member_assigned_groups WHERE group_id = $1 AND member_id = $2")
            .bind(group_id)
            .bind(member_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected())
    }
}

impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Store for PgSqlx<Transaction<'a, Postgres>> {}
impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Common for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStore for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx { executor: tx })
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx { executor: conn })
    }
}
