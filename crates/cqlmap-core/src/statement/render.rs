use crate::statement::{
    Assignment, Condition, Delete, Insert, Operator, Relation, Select, Statement, Update,
};
use std::fmt::{self, Write};

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert(s) => render_insert(f, s),
            Self::Update(s) => render_update(f, s),
            Self::Delete(s) => render_delete(f, s),
            Self::Select(s) => render_select(f, s),
        }
    }
}

fn render_insert(f: &mut fmt::Formatter<'_>, s: &Insert) -> fmt::Result {
    let columns: Vec<&str> = s.columns.iter().map(|(c, _)| c.as_str()).collect();
    let markers = vec!["?"; columns.len()];
    write!(
        f,
        "INSERT INTO {} ({}) VALUES ({})",
        s.table,
        columns.join(", "),
        markers.join(", ")
    )?;
    if s.if_not_exists {
        f.write_str(" IF NOT EXISTS")?;
    }
    if s.ttl.is_some() {
        f.write_str(" USING TTL ?")?;
    }

    Ok(())
}

fn render_update(f: &mut fmt::Formatter<'_>, s: &Update) -> fmt::Result {
    write!(f, "UPDATE {}", s.table)?;
    if s.ttl.is_some() {
        f.write_str(" USING TTL ?")?;
    }

    let assignments: Vec<String> = s.assignments.iter().map(render_assignment).collect();
    write!(f, " SET {}", assignments.join(", "))?;
    render_where(f, &s.relations)?;
    render_conditions(f, &s.conditions, s.if_exists)
}

fn render_delete(f: &mut fmt::Formatter<'_>, s: &Delete) -> fmt::Result {
    f.write_str("DELETE ")?;
    if !s.columns.is_empty() {
        write!(f, "{} ", s.columns.join(", "))?;
    }
    write!(f, "FROM {}", s.table)?;
    render_where(f, &s.relations)?;
    render_conditions(f, &s.conditions, s.if_exists)
}

fn render_select(f: &mut fmt::Formatter<'_>, s: &Select) -> fmt::Result {
    let columns = if s.columns.is_empty() {
        "*".to_string()
    } else {
        s.columns.join(", ")
    };
    write!(f, "SELECT {columns} FROM {}", s.table)?;
    render_where(f, &s.relations)?;

    if !s.order_by.is_empty() {
        let orders: Vec<String> = s.order_by.iter().map(ToString::to_string).collect();
        write!(f, " ORDER BY {}", orders.join(", "))?;
    }
    if let Some(limit) = s.limit {
        write!(f, " LIMIT {limit}")?;
    }

    Ok(())
}

fn render_assignment(assignment: &Assignment) -> String {
    match assignment {
        Assignment::Set { column, .. } => format!("{column} = ?"),
        Assignment::SetAtIndex { column, index, .. } => format!("{column}[{index}] = ?"),
        Assignment::SetKey { column, .. } => format!("{column}[?] = ?"),
        Assignment::AddTo { column, .. } => format!("{column} = {column} + ?"),
        Assignment::Prepend { column, .. } => format!("{column} = ? + {column}"),
        Assignment::RemoveFrom { column, .. } => format!("{column} = {column} - ?"),
    }
}

// Equalities are chained in the given order: the first seeds the clause,
// the rest are ANDed.
fn render_where(f: &mut fmt::Formatter<'_>, relations: &[Relation]) -> fmt::Result {
    let mut clause = String::new();
    for (i, relation) in relations.iter().enumerate() {
        clause.push_str(if i == 0 { " WHERE " } else { " AND " });
        match relation {
            Relation::Column { column, op, .. } => {
                write!(clause, "{column} {} ?", op.as_str())?;
            }
            Relation::Tuple { columns, op, .. } => {
                let markers = vec!["?"; columns.len()];
                write!(
                    clause,
                    "({}) {} ({})",
                    columns.join(", "),
                    op.as_str(),
                    markers.join(", ")
                )?;
            }
        }
    }

    f.write_str(&clause)
}

fn render_conditions(
    f: &mut fmt::Formatter<'_>,
    conditions: &[Condition],
    if_exists: bool,
) -> fmt::Result {
    if if_exists {
        return f.write_str(" IF EXISTS");
    }

    for (i, condition) in conditions.iter().enumerate() {
        let lead = if i == 0 { " IF " } else { " AND " };
        write!(f, "{lead}{} {} ?", condition.column, Operator::Eq.as_str())?;
    }

    Ok(())
}
