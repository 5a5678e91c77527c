use crate::error::Result;
use crate::models::result::{ResultRecord, ResultRow};
use rust_xlsxwriter::*;

pub const MARKS_SHEET_FILE: &str = "marks_sheet.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct ExportService;

impl ExportService {
    /// Projects results to (Student, Score) rows, keeping input order.
    pub fn rows(results: &[ResultRecord]) -> Vec<ResultRow> {
        results.iter().map(ResultRow::from).collect()
    }

    /// Builds the marks sheet: one header row, then one row per result.
    pub fn generate_marks_xlsx(results: &[ResultRecord]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Marks")?;

        let border_color = Color::RGB(0xE2E8F0);
        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::White)
            .set_background_color(Color::RGB(0x0F172A))
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let cell_format = Format::new()
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let columns = [("Student", 32.0), ("Score", 10.0)];
        for (i, (name, width)) in columns.iter().enumerate() {
            worksheet.set_column_width(i as u16, *width)?;
            worksheet.write_string_with_format(0, i as u16, *name, &header_format)?;
        }

        for (idx, row) in Self::rows(results).iter().enumerate() {
            let r = (idx + 1) as u32;
            worksheet.write_string_with_format(r, 0, &row.student, &cell_format)?;
            worksheet.write_number_with_format(r, 1, row.score as f64, &cell_format)?;
        }

        worksheet.set_freeze_panes(1, 0)?;

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
