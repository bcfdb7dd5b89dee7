/// Text layout for the table screen, creation dialog and viewer header
use crossterm::{
    cursor,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use shapeview_core::form::{Field, ShapeForm};
use shapeview_core::shape::NAME_MAX_CHARS;
use shapeview_core::{Scene, TableLayout, TableRow};
use std::io::Write;

pub const TITLE: &str = "3D Shape Visualization and Control";

/// Rows reserved above the 3D view
pub const VIEWER_HEADER_ROWS: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Header,
    Normal,
    Highlighted,
    Hint,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

pub fn table_lines(rows: &[TableRow], layout: TableLayout, status: Option<&str>) -> Vec<Line> {
    let mut lines = vec![
        Line::new(TITLE, LineStyle::Title),
        Line::new(
            "[c] create  [a] render all  [r] render  [d] delete  [space] details  [q] quit",
            LineStyle::Hint,
        ),
        Line::new("", LineStyle::Normal),
    ];

    if rows.is_empty() {
        lines.push(Line::new("No shapes yet. Press [c] to create one.", LineStyle::Hint));
    }

    match layout {
        TableLayout::Full => {
            if !rows.is_empty() {
                lines.push(Line::new(
                    format!("{:<15} {:<16} {:<9} {}", "ID", "Name", "Type", "Actions"),
                    LineStyle::Header,
                ));
            }
            for row in rows {
                let text = format!(
                    "{:<15} {:<16} {:<9} [r]ender [d]elete",
                    row.id,
                    row.name,
                    row.type_label
                );
                lines.push(Line::new(text, row_style(row)));
            }
        }
        TableLayout::Collapsed => {
            for row in rows {
                let marker = if row.expanded { 'v' } else { '>' };
                lines.push(Line::new(format!("{marker} {}", row.name), row_style(row)));
                if row.expanded {
                    lines.push(Line::new(format!("    id:   {}", row.id), LineStyle::Normal));
                    lines.push(Line::new(format!("    type: {}", row.type_label), LineStyle::Normal));
                    lines.push(Line::new("    [r]ender [d]elete", LineStyle::Hint));
                }
            }
        }
    }

    if let Some(status) = status {
        lines.push(Line::new("", LineStyle::Normal));
        lines.push(Line::new(status, LineStyle::Hint));
    }
    lines
}

fn row_style(row: &TableRow) -> LineStyle {
    if row.highlighted {
        LineStyle::Highlighted
    } else {
        LineStyle::Normal
    }
}

pub fn form_lines(form: &ShapeForm) -> Vec<Line> {
    let focus = |field| if form.focus() == Some(field) { '>' } else { ' ' };
    let errors = form.errors();

    let name = format!("{} Name: [{:<width$}]", focus(Field::Name), form.name(), width = NAME_MAX_CHARS);
    let kind = match form.kind() {
        Some(kind) => format!("{} Type: < {} >", focus(Field::Kind), kind),
        None => format!("{} Type: < select >", focus(Field::Kind)),
    };
    let hint_style = if errors.name.is_some() {
        LineStyle::Error
    } else {
        LineStyle::Hint
    };

    let mut lines = vec![
        Line::new("Create New Shape", LineStyle::Title),
        Line::new("", LineStyle::Normal),
        Line::new(name, LineStyle::Normal),
        Line::new(format!("        {}", form.name_hint()), hint_style),
        Line::new(kind, LineStyle::Normal),
    ];
    if let Some(message) = errors.kind {
        lines.push(Line::new(format!("        {message}"), LineStyle::Error));
    }
    lines.push(Line::new("", LineStyle::Normal));
    lines.push(Line::new(
        "[Enter] create  [Esc] cancel  [Tab] field  [</>] type",
        LineStyle::Hint,
    ));
    lines
}

pub fn viewer_header(scene: &Scene, fps: f32, size_input: &str) -> Vec<Line> {
    let selected = match scene.selected_record() {
        Some(shape) => format!("{} ({}, id {})", shape.name, shape.type_label(), shape.id),
        None => "none".to_string(),
    };
    let size = if size_input.is_empty() {
        format!("{:.1}", scene.size())
    } else {
        format!("{size_input}_")
    };
    vec![
        Line::new(
            format!("Selected: {selected} | Size: {size} | FPS: {fps:.1}"),
            LineStyle::Title,
        ),
        Line::new(
            "click=select drag=move arrows=orbit +/-/digits=size p=projection q/Esc=close",
            LineStyle::Hint,
        ),
    ]
}

/// Draw `lines` from row `top`, column `left`, each clipped to `width`
pub fn draw_lines<W: Write>(
    writer: &mut W,
    lines: &[Line],
    top: u16,
    left: u16,
    width: u16,
) -> std::io::Result<()> {
    for (i, line) in lines.iter().enumerate() {
        let text: String = line.text.chars().take(width as usize).collect();
        writer.queue(cursor::MoveTo(left, top + i as u16))?;
        writer.queue(Clear(ClearType::UntilNewLine))?;
        match line.style {
            LineStyle::Title => {
                writer.queue(SetForegroundColor(Color::Yellow))?;
                writer.queue(SetAttribute(Attribute::Bold))?;
            }
            LineStyle::Header => {
                writer.queue(SetAttribute(Attribute::Underlined))?;
            }
            LineStyle::Highlighted => {
                writer.queue(SetAttribute(Attribute::Reverse))?;
            }
            LineStyle::Hint => {
                writer.queue(SetForegroundColor(Color::DarkGrey))?;
            }
            LineStyle::Error => {
                writer.queue(SetForegroundColor(Color::Red))?;
            }
            LineStyle::Normal => {}
        }
        writer.queue(Print(text))?;
        writer.queue(SetAttribute(Attribute::Reset))?;
        writer.queue(ResetColor)?;
    }
    Ok(())
}
