//! Warehouse pick slip layout.

use super::canvas::{
    line_height, Align, Canvas, Color, Paint, PdfCanvas, TextStyle, CONTENT_BOTTOM,
    CONTENT_WIDTH, MARGIN, PAGE_HEIGHT, PAGE_WIDTH,
};
use super::format::{
    capitalize, format_naive_date, format_short_date, format_timestamp, is_rush,
    requires_delivery, truncate, wrap_text,
};
use super::template::DocumentTemplateData;
use super::{RenderError, RenderedPdf};

const RIGHT: f32 = PAGE_WIDTH - MARGIN;
const CHECKBOX: f32 = 4.0;
const ROW_HEIGHT: f32 = 8.0;
const HEADER_HEIGHT: f32 = 7.0;
const CONTINUED_TOP: f32 = MARGIN + 10.0;

const COL_QTY: f32 = MARGIN + 3.0;
const COL_DESCRIPTION: f32 = MARGIN + 20.0;
const COL_TYPE: f32 = 135.0;
const COL_CHECK: f32 = RIGHT - 14.0;

pub const FULFILLMENT_CHECKLIST: [&str; 6] = [
    "All items picked and counted",
    "Product quality inspected",
    "Items packaged for transport",
    "Add-ons and services prepared",
    "Paperwork included with order",
    "Customer notified of readiness",
];

pub fn render_pick_slip(data: &DocumentTemplateData) -> Result<RenderedPdf, RenderError> {
    let mut canvas = PdfCanvas::new(&format!("Pick Slip {}", data.order.order_number))?;
    draw_pick_slip(&mut canvas, data);
    let page_count = canvas.page_count();
    let bytes = canvas.finish()?;
    Ok(RenderedPdf { bytes, page_count })
}

pub fn draw_pick_slip<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData) {
    draw_header(canvas, data);
    let y = draw_info_boxes(canvas, data, 36.0);
    let y = draw_customer_box(canvas, data, y + 6.0);

    let item_rows: Vec<PickRow> = data
        .items
        .iter()
        .map(|item| PickRow {
            quantity: item.quantity.to_string(),
            description: item.product_name.clone().unwrap_or_else(|| "Item".to_string()),
            tag: item
                .product_type
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(capitalize)
                .unwrap_or_default(),
        })
        .collect();
    let y = draw_pick_table(canvas, "PICK LIST", &item_rows, y + 8.0);

    let y = if data.addons.is_empty() {
        y
    } else {
        let addon_rows: Vec<PickRow> = data
            .addons
            .iter()
            .map(|addon| PickRow {
                quantity: "1".to_string(),
                description: addon.addon_name.clone().unwrap_or_else(|| "Add-on".to_string()),
                tag: "SERVICE".to_string(),
            })
            .collect();
        draw_pick_table(canvas, "ADD-ONS & SERVICES", &addon_rows, y + 6.0)
    };

    let y = draw_instructions(canvas, data, y + 6.0);
    let y = draw_checklist(canvas, y + 6.0);
    draw_signatures(canvas, y + 6.0);
    draw_page_footers(canvas, data);
}

fn draw_header<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData) {
    canvas.text(
        data.company.name,
        MARGIN,
        16.0,
        TextStyle::new(10.0).bold().color(Color::MUTED),
    );
    canvas.text(
        &format!("Printed: {}", format_timestamp(&data.generated_at)),
        RIGHT,
        16.0,
        TextStyle::new(8.0).color(Color::MUTED).align(Align::Right),
    );
    canvas.text(
        "PICK SLIP",
        PAGE_WIDTH / 2.0,
        26.0,
        TextStyle::new(24.0).bold().align(Align::Center),
    );
    canvas.horizontal_rule(30.0, Color::BLACK);
}

fn boxed_lines<C: Canvas>(canvas: &mut C, x: f32, top: f32, width: f32, height: f32, title: &str) {
    canvas.rect(x, top, width, height, Paint::Stroke(Color::BORDER));
    canvas.rect(x, top, width, HEADER_HEIGHT, Paint::Fill(Color::HEADER_FILL));
    canvas.text(title, x + 3.0, top + 5.0, TextStyle::new(9.0).bold());
}

fn draw_info_boxes<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let order = &data.order;
    let gap = 6.0;
    let width = (CONTENT_WIDTH - gap) / 2.0;
    let height = 34.0;
    let body = TextStyle::new(10.0);
    let step = line_height(10.0) + 1.0;

    let left = MARGIN;
    boxed_lines(canvas, left, top, width, height, "ORDER INFORMATION");
    let mut y = top + HEADER_HEIGHT + 6.0;
    canvas.text(&format!("Order #: {}", order.order_number), left + 3.0, y, body.bold());
    y += step;
    if let Some(po) = order.po_number.as_deref().filter(|p| !p.is_empty()) {
        canvas.text(&format!("PO #: {}", po), left + 3.0, y, body);
        y += step;
    }
    canvas.text(
        &format!("Status: {}", order.status.as_str().to_uppercase()),
        left + 3.0,
        y,
        body,
    );

    let right = MARGIN + width + gap;
    boxed_lines(canvas, right, top, width, height, "FULFILLMENT");
    let mut y = top + HEADER_HEIGHT + 6.0;
    canvas.text(
        &format!("Order Date: {}", format_short_date(&order.created_at)),
        right + 3.0,
        y,
        body,
    );
    y += step;
    if let Some(requested) = &order.requested_date {
        canvas.text(
            &format!("Requested: {}", format_naive_date(requested)),
            right + 3.0,
            y,
            body.bold(),
        );
        y += step;
    }
    if is_rush(order.special_instructions.as_deref()) {
        canvas.text(
            "RUSH ORDER",
            right + 3.0,
            y + 1.0,
            TextStyle::new(12.0).bold().color(Color::RUSH_RED),
        );
    }

    top + height
}

fn draw_customer_box<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let order = &data.order;
    let delivery = requires_delivery(data.addon_names());
    let body = TextStyle::new(10.0);
    let step = line_height(10.0) + 0.8;

    let mut customer = Vec::new();
    if let Some(company) = order.company_name.as_deref().filter(|c| !c.is_empty()) {
        customer.push(company.to_string());
    }
    customer.push(order.contact_name.clone());
    if let Some(phone) = order.phone.as_deref().filter(|p| !p.is_empty()) {
        customer.push(phone.to_string());
    }
    customer.push(order.email.clone());

    let mut address = Vec::new();
    if let Some(street) = order.delivery_address.as_deref().filter(|a| !a.is_empty()) {
        address.push(street.to_string());
    }
    let locality = [order.city.as_deref(), order.state.as_deref(), order.zip_code.as_deref()]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !locality.is_empty() {
        address.push(locality);
    }
    if address.is_empty() {
        address.push("Customer pickup".to_string());
    }

    let banner = if delivery { 8.0 } else { 0.0 };
    let rows = customer.len().max(address.len()) as f32;
    let height = HEADER_HEIGHT + banner + 5.0 + rows * step;
    boxed_lines(canvas, MARGIN, top, CONTENT_WIDTH, height, "CUSTOMER & DELIVERY");

    let mut y = top + HEADER_HEIGHT;
    if delivery {
        canvas.rect(MARGIN + 2.0, y + 1.0, CONTENT_WIDTH - 4.0, 6.0, Paint::Fill(Color::BANNER_YELLOW));
        canvas.text(
            "DELIVERY REQUIRED",
            PAGE_WIDTH / 2.0,
            y + 5.3,
            TextStyle::new(10.0).bold().align(Align::Center),
        );
        y += banner;
    }

    let column = MARGIN + CONTENT_WIDTH / 2.0;
    let mut left_y = y + 5.0;
    for (i, line) in customer.iter().enumerate() {
        canvas.text(line, MARGIN + 3.0, left_y, if i == 0 { body.bold() } else { body });
        left_y += step;
    }
    let mut right_y = y + 5.0;
    for line in &address {
        canvas.text(line, column, right_y, body);
        right_y += step;
    }

    top + height
}

struct PickRow {
    quantity: String,
    description: String,
    tag: String,
}

fn draw_table_header<C: Canvas>(canvas: &mut C, top: f32) -> f32 {
    canvas.rect(MARGIN, top, CONTENT_WIDTH, HEADER_HEIGHT, Paint::Fill(Color::BRAND));
    let style = TextStyle::new(9.0).bold().color(Color::WHITE);
    let baseline = top + 5.0;
    canvas.text("QTY", COL_QTY, baseline, style);
    canvas.text("DESCRIPTION", COL_DESCRIPTION, baseline, style);
    canvas.text("TYPE", COL_TYPE, baseline, style);
    canvas.text("PICKED", RIGHT - 3.0, baseline, style.align(Align::Right));
    top + HEADER_HEIGHT
}

fn draw_pick_table<C: Canvas>(canvas: &mut C, title: &str, rows: &[PickRow], top: f32) -> f32 {
    let mut y = top;
    if y + 6.0 + HEADER_HEIGHT + ROW_HEIGHT > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }
    canvas.text(title, MARGIN, y, TextStyle::new(11.0).bold());
    y = draw_table_header(canvas, y + 2.0);

    for (index, row) in rows.iter().enumerate() {
        if y + ROW_HEIGHT > CONTENT_BOTTOM {
            canvas.new_page();
            y = draw_table_header(canvas, CONTINUED_TOP);
        }
        if index % 2 == 0 {
            canvas.rect(MARGIN, y, CONTENT_WIDTH, ROW_HEIGHT, Paint::Fill(Color::ROW_SHADE));
        }
        let baseline = y + 5.5;
        canvas.text(&row.quantity, COL_QTY, baseline, TextStyle::new(11.0).bold());
        canvas.text(&truncate(&row.description, 50), COL_DESCRIPTION, baseline, TextStyle::new(10.0));
        canvas.text(&row.tag, COL_TYPE, baseline, TextStyle::new(9.0).color(Color::MUTED));
        canvas.checkbox(COL_CHECK, y + (ROW_HEIGHT - CHECKBOX) / 2.0, CHECKBOX);
        y += ROW_HEIGHT;
    }
    canvas.horizontal_rule(y, Color::BORDER);

    y
}

fn draw_instructions<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let instructions = match data
        .order
        .special_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(text) => text,
        None => return top - 6.0,
    };

    let lines = wrap_text(instructions, 90);
    let height = 10.0 + lines.len() as f32 * 4.8;
    let mut y = top;
    if y + height > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }

    canvas.rect(
        MARGIN,
        y,
        CONTENT_WIDTH,
        height,
        Paint::FillStroke { fill: Color::NOTE_YELLOW, stroke: Color::BANNER_YELLOW },
    );
    canvas.text("SPECIAL INSTRUCTIONS", MARGIN + 3.0, y + 5.5, TextStyle::new(9.0).bold());
    let mut line_y = y + 10.5;
    for line in &lines {
        canvas.text(line, MARGIN + 3.0, line_y, TextStyle::new(10.0));
        line_y += 4.8;
    }

    y + height
}

fn draw_checklist<C: Canvas>(canvas: &mut C, top: f32) -> f32 {
    let height = 8.0 + FULFILLMENT_CHECKLIST.len() as f32 * 6.5;
    let mut y = top;
    if y + height > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }

    canvas.text("FULFILLMENT CHECKLIST", MARGIN, y + 4.0, TextStyle::new(11.0).bold());
    let mut row_y = y + 8.0;
    for entry in FULFILLMENT_CHECKLIST {
        canvas.checkbox(MARGIN + 2.0, row_y, CHECKBOX);
        canvas.text(entry, MARGIN + 9.0, row_y + 3.4, TextStyle::new(10.0));
        row_y += 6.5;
    }

    y + height
}

fn draw_signatures<C: Canvas>(canvas: &mut C, top: f32) {
    let mut y = top;
    if y + 26.0 > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }

    let label = TextStyle::new(9.0).color(Color::MUTED);
    for (i, role) in ["Picked by", "Quality Check"].iter().enumerate() {
        let line_y = y + 10.0 + i as f32 * 12.0;
        canvas.line((MARGIN, line_y), (MARGIN + 95.0, line_y), Color::BLACK, 0.3);
        canvas.text(role, MARGIN, line_y + 4.0, label);
        canvas.line((125.0, line_y), (RIGHT, line_y), Color::BLACK, 0.3);
        canvas.text("Date", 125.0, line_y + 4.0, label);
    }
}

fn draw_page_footers<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData) {
    let pages = canvas.page_count();
    let style = TextStyle::new(8.0).color(Color::MUTED);
    let y = PAGE_HEIGHT - 10.0;
    for index in 0..pages {
        canvas.set_page(index);
        canvas.text(&format!("Order {}", data.order.order_number), MARGIN, y, style);
        canvas.text(
            &format!("Page {} of {}", index + 1, pages),
            RIGHT,
            y,
            style.align(Align::Right),
        );
    }
}
