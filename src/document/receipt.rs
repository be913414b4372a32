//! Customer receipt layout.

use super::canvas::{
    line_height, Align, Canvas, Color, Paint, PdfCanvas, TextStyle, CONTENT_BOTTOM, MARGIN,
    PAGE_WIDTH,
};
use super::format::{capitalize, format_currency, format_naive_date, format_short_date, truncate, wrap_text};
use super::template::DocumentTemplateData;
use super::{RenderError, RenderedPdf};

const RIGHT: f32 = PAGE_WIDTH - MARGIN;
const QTY_X: f32 = 125.0;
const UNIT_X: f32 = 158.0;
const TOTAL_X: f32 = RIGHT - 2.0;
const TABLE_HEADER_HEIGHT: f32 = 8.0;
const CONTINUED_TOP: f32 = MARGIN + 10.0;

pub fn render_receipt(data: &DocumentTemplateData) -> Result<RenderedPdf, RenderError> {
    let mut canvas = PdfCanvas::new(&format!("Receipt {}", data.order.order_number))?;
    draw_receipt(&mut canvas, data);
    let page_count = canvas.page_count();
    let bytes = canvas.finish()?;
    Ok(RenderedPdf { bytes, page_count })
}

pub fn draw_receipt<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData) {
    draw_header(canvas, data);
    let y = draw_parties(canvas, data, 54.0);
    let y = draw_line_items(canvas, data, y + 8.0);
    let y = draw_totals(canvas, data, y + 4.0);
    draw_footer(canvas, data, y + 10.0);
}

fn draw_header<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData) {
    let company = &data.company;
    canvas.text(company.name, MARGIN, 22.0, TextStyle::new(16.0).bold().color(Color::BRAND));

    let muted = TextStyle::new(9.0).color(Color::MUTED);
    canvas.text(company.address, MARGIN, 28.0, muted);
    canvas.text(company.city_line, MARGIN, 32.0, muted);
    canvas.text(&format!("{} | {}", company.phone, company.email), MARGIN, 36.0, muted);
    canvas.text(company.website, MARGIN, 40.0, muted);

    canvas.text(
        "RECEIPT",
        RIGHT,
        24.0,
        TextStyle::new(22.0).bold().color(Color::BRAND).align(Align::Right),
    );
    canvas.text(
        &format!("Date: {}", format_short_date(&data.generated_at)),
        RIGHT,
        31.0,
        TextStyle::new(10.0).align(Align::Right),
    );

    canvas.horizontal_rule(46.0, Color::BORDER);
}

/// Bill-to block on the left and the order box on the right. Returns the lower of the two bottoms.
fn draw_parties<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let order = &data.order;
    let body = TextStyle::new(10.0);
    let step = line_height(10.0) + 0.8;

    canvas.text("BILL TO", MARGIN, top, TextStyle::new(10.0).bold().color(Color::MUTED));
    let mut lines: Vec<(String, TextStyle)> = Vec::new();
    if let Some(company) = order.company_name.as_deref().filter(|c| !c.is_empty()) {
        lines.push((company.to_string(), body.bold()));
    }
    lines.push((order.contact_name.clone(), body));
    lines.push((order.email.clone(), body));
    if let Some(phone) = &order.phone {
        lines.push((phone.clone(), body));
    }
    if let Some(address) = &order.delivery_address {
        lines.push((address.clone(), body));
    }
    let locality = city_state_zip(data);
    if !locality.is_empty() {
        lines.push((locality, body));
    }

    let mut y = top + step;
    for (text, style) in &lines {
        canvas.text(text, MARGIN, y, *style);
        y += step;
    }

    let mut rows = vec![("Order #", order.order_number.clone())];
    if let Some(po) = order.po_number.as_deref().filter(|p| !p.is_empty()) {
        rows.push(("PO Number", po.to_string()));
    }
    rows.push(("Order Date", format_short_date(&order.created_at)));
    if let Some(requested) = &order.requested_date {
        rows.push(("Requested", format_naive_date(requested)));
    }

    let box_x = 118.0;
    let box_width = RIGHT - box_x;
    let box_top = top - 5.0;
    let box_height = 6.0 + rows.len() as f32 * 6.0;
    canvas.rect(
        box_x,
        box_top,
        box_width,
        box_height,
        Paint::FillStroke { fill: Color::HEADER_FILL, stroke: Color::BORDER },
    );
    let mut row_y = box_top + 7.0;
    for (label, value) in &rows {
        canvas.text(label, box_x + 3.0, row_y, TextStyle::new(9.0).bold());
        canvas.text(value, RIGHT - 3.0, row_y, TextStyle::new(9.0).align(Align::Right));
        row_y += 6.0;
    }

    y.max(box_top + box_height)
}

fn city_state_zip(data: &DocumentTemplateData) -> String {
    let order = &data.order;
    let mut out = String::new();
    if let Some(city) = order.city.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(city);
    }
    if let Some(state) = order.state.as_deref().filter(|s| !s.is_empty()) {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(state);
    }
    if let Some(zip) = order.zip_code.as_deref().filter(|z| !z.is_empty()) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(zip);
    }
    out
}

fn draw_table_header<C: Canvas>(canvas: &mut C, top: f32) -> f32 {
    canvas.rect(
        MARGIN,
        top,
        RIGHT - MARGIN,
        TABLE_HEADER_HEIGHT,
        Paint::Fill(Color::HEADER_FILL),
    );
    let style = TextStyle::new(9.0).bold();
    let baseline = top + 5.5;
    canvas.text("Description", MARGIN + 2.0, baseline, style);
    canvas.text("Qty", QTY_X, baseline, style.align(Align::Right));
    canvas.text("Unit Price", UNIT_X, baseline, style.align(Align::Right));
    canvas.text("Total", TOTAL_X, baseline, style.align(Align::Right));
    top + TABLE_HEADER_HEIGHT
}

struct TableRow {
    description: String,
    detail: Option<String>,
    quantity: String,
    unit_price: f64,
    line_total: f64,
}

fn table_rows(data: &DocumentTemplateData) -> Vec<TableRow> {
    let items = data.items.iter().map(|item| TableRow {
        description: item.product_name.clone().unwrap_or_else(|| "Item".to_string()),
        detail: item
            .product_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(capitalize),
        quantity: item.quantity.to_string(),
        unit_price: item.unit_price,
        line_total: item.total_price,
    });
    let addons = data.addons.iter().map(|addon| TableRow {
        description: addon.addon_name.clone().unwrap_or_else(|| "Add-on".to_string()),
        detail: addon.addon_description.clone().filter(|d| !d.is_empty()),
        quantity: "1".to_string(),
        unit_price: addon.price,
        line_total: addon.price,
    });
    items.chain(addons).collect()
}

fn draw_line_items<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let mut y = draw_table_header(canvas, top);

    for row in table_rows(data) {
        let height = if row.detail.is_some() { 11.0 } else { 7.5 };
        if y + height > CONTENT_BOTTOM {
            canvas.new_page();
            y = draw_table_header(canvas, CONTINUED_TOP);
        }

        let baseline = y + 5.0;
        let body = TextStyle::new(10.0);
        canvas.text(&truncate(&row.description, 55), MARGIN + 2.0, baseline, body);
        canvas.text(&row.quantity, QTY_X, baseline, body.align(Align::Right));
        canvas.text(&format_currency(row.unit_price), UNIT_X, baseline, body.align(Align::Right));
        canvas.text(&format_currency(row.line_total), TOTAL_X, baseline, body.align(Align::Right));
        if let Some(detail) = &row.detail {
            canvas.text(
                &truncate(detail, 70),
                MARGIN + 2.0,
                baseline + 4.2,
                TextStyle::new(8.0).color(Color::MUTED),
            );
        }

        y += height;
        canvas.horizontal_rule(y, Color::BORDER);
    }

    y
}

fn draw_totals<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) -> f32 {
    let order = &data.order;
    let mut y = top;
    if y + 26.0 > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }

    let label_x = 140.0;
    let body = TextStyle::new(10.0);

    y += 6.0;
    canvas.text("Subtotal:", label_x, y, body);
    canvas.text(&format_currency(order.subtotal), TOTAL_X, y, body.align(Align::Right));

    if order.addon_total != 0.0 {
        y += 6.0;
        canvas.text("Add-ons:", label_x, y, body);
        canvas.text(&format_currency(order.addon_total), TOTAL_X, y, body.align(Align::Right));
    }

    y += 3.0;
    canvas.line((label_x, y), (RIGHT, y), Color::BLACK, 0.4);
    y += 6.0;
    let total = TextStyle::new(12.0).bold();
    canvas.text("Total:", label_x, y, total);
    canvas.text(&format_currency(order.total), TOTAL_X, y, total.align(Align::Right));

    y
}

fn draw_footer<C: Canvas>(canvas: &mut C, data: &DocumentTemplateData, top: f32) {
    let mut y = top;

    if let Some(instructions) = data
        .order
        .special_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        let lines = wrap_text(instructions, 95);
        if y + 8.0 + lines.len() as f32 * 4.5 > CONTENT_BOTTOM {
            canvas.new_page();
            y = CONTINUED_TOP;
        }
        canvas.text("Special Instructions", MARGIN, y, TextStyle::new(10.0).bold());
        y += 5.0;
        for line in lines {
            canvas.text(&line, MARGIN, y, TextStyle::new(9.0));
            y += 4.5;
        }
        y += 6.0;
    }

    if y + 10.0 > CONTENT_BOTTOM {
        canvas.new_page();
        y = CONTINUED_TOP;
    }
    canvas.horizontal_rule(y, Color::BORDER);
    let center = PAGE_WIDTH / 2.0;
    canvas.text(
        "Thank you for your business!",
        center,
        y + 7.0,
        TextStyle::new(11.0).bold().color(Color::BRAND).align(Align::Center),
    );
    canvas.text(
        &format!("Questions? Contact {} or {}", data.company.email, data.company.phone),
        center,
        y + 12.0,
        TextStyle::new(8.0).color(Color::MUTED).align(Align::Center),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::canvas::recording::{pdf_text_runs, RecordingCanvas};
    use crate::document::template::fixtures;

    #[test]
    fn test_totals_render_as_currency() {
        let order = fixtures::order(100.0, 25.0, None);
        let item = fixtures::item(order.id, "Mixed Variety", 2, 50.0);
        let addon = fixtures::addon(order.id, "Gift Wrap", 25.0);
        let data = fixtures::template(order, vec![item], vec![addon]);

        let mut canvas = RecordingCanvas::new();
        draw_receipt(&mut canvas, &data);

        assert!(canvas.has_text("$100.00"));
        assert!(canvas.has_text("$25.00"));
        assert!(canvas.has_text("$125.00"));
        assert!(canvas.has_text("Add-ons:"));
        assert!(canvas.has_text("RECEIPT"));
    }

    #[test]
    fn test_zero_addon_total_is_omitted() {
        let order = fixtures::order(40.0, 0.0, None);
        let item = fixtures::item(order.id, "Tulips", 4, 10.0);
        let data = fixtures::template(order, vec![item], vec![]);

        let mut canvas = RecordingCanvas::new();
        draw_receipt(&mut canvas, &data);

        assert!(!canvas.has_text("Add-ons:"));
        assert!(canvas.has_text("Total:"));
        assert!(canvas.has_text("Bouquet"));
    }

    #[test]
    fn test_order_box_shows_optional_fields_only_when_present() {
        let mut order = fixtures::order(10.0, 0.0, None);
        order.po_number = None;
        let data = fixtures::template(order, vec![], vec![]);

        let mut canvas = RecordingCanvas::new();
        draw_receipt(&mut canvas, &data);

        assert!(canvas.has_text("PO-1001"));
        assert!(!canvas.has_text("PO Number"));
        assert!(!canvas.has_text("Requested"));
    }

    #[test]
    fn test_special_instructions_are_wrapped() {
        let note = "Leave the boxes at the loading dock behind the building and ring the bell twice so the night crew knows the delivery has arrived";
        let order = fixtures::order(10.0, 0.0, Some(note));
        let data = fixtures::template(order, vec![], vec![]);

        let mut canvas = RecordingCanvas::new();
        draw_receipt(&mut canvas, &data);

        assert!(canvas.has_text("Special Instructions"));
        assert!(canvas.has_text_containing("Leave the boxes"));
        assert!(canvas.has_text_containing("arrived"));
        assert!(canvas.has_text("Thank you for your business!"));
    }

    #[test]
    fn test_long_orders_continue_on_new_pages() {
        let order = fixtures::order(600.0, 0.0, None);
        let items = (0..60)
            .map(|i| fixtures::item(order.id, &format!("Stem {}", i), 1, 10.0))
            .collect();
        let data = fixtures::template(order, items, vec![]);

        let mut canvas = RecordingCanvas::new();
        draw_receipt(&mut canvas, &data);

        assert!(canvas.page_count() > 1);
        assert!(canvas.has_text("Stem 59"));
    }

    #[test]
    fn test_render_receipt_returns_pdf() {
        let order = fixtures::order(100.0, 0.0, None);
        let item = fixtures::item(order.id, "Mixed Variety", 2, 50.0);
        let data = fixtures::template(order, vec![item], vec![]);

        let rendered = render_receipt(&data).unwrap();
        assert!(rendered.bytes.starts_with(b"%PDF"));
        assert_eq!(rendered.page_count, 1);
    }

    #[test]
    fn test_rendered_pdf_contains_totals() {
        let order = fixtures::order(100.0, 25.0, None);
        let item = fixtures::item(order.id, "Mixed Variety", 2, 50.0);
        let addon = fixtures::addon(order.id, "Gift Wrap", 25.0);
        let data = fixtures::template(order, vec![item], vec![addon]);

        let rendered = render_receipt(&data).unwrap();
        let runs = pdf_text_runs(&rendered.bytes);

        for amount in ["$100.00", "$25.00", "$125.00"] {
            assert!(runs.iter().any(|r| r == amount), "{} missing from {:?}", amount, runs);
        }
        assert!(runs.iter().any(|r| r == "RECEIPT"));
        assert!(runs.iter().any(|r| r == "Mixed Variety"));
    }
}
