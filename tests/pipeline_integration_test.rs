// ==========================================
// 流水线集成测试
// ==========================================
// 覆盖: 分类 → 结构校验 → 数据质量 → 数仓装载 全链路
// ==========================================


use loyalty_etl::domain::artifact::{
    batch_file_name, quality_error_file_name, remote_key, schema_error_file_name,
};
use loyalty_etl::importer::{ExcelParser, WorkbookParser};
use loyalty_etl::pipeline::{load_context, save_context};
use loyalty_etl::DatasetKind;
use test_helpers::*;

type SummaryRow = (String, String, i64, f64, i64, f64, f64);

fn summary_rows(env: &TestEnv) -> Vec<SummaryRow> {
    let conn = env.warehouse();
    let mut stmt = conn
        .prepare(
            "SELECT app_date, user_id, user_total_lp_earned, user_total_revenue, \
             user_total_purchases, user_avg_revenue_per_purchase, total_daily_revenue \
             FROM hourly_daily_summary ORDER BY app_date, user_id",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}

fn expected_summary() -> Vec<SummaryRow> {
    vec![
        ("2024-01-01 10:00:00".to_string(), "AB12cde".to_string(), 10, 2.5, 1, 2.5, 3.75),
        ("2024-01-01 11:00:00".to_string(), "AB12cde".to_string(), 4, 1.25, 1, 1.25, 3.75),
    ]
}

#[tokio::test]
async fn test_full_run_over_mixed_workbooks() {
    let env = TestEnv::new();
    let runner = env.runner();

    let report = runner.run_workbooks(&sample_workbooks()).await.unwrap();

    // notes / partial 两个 sheet 不匹配任何数据集
    assert_eq!(report.extracted_batches, 3);
    assert_eq!(report.validation.valid_batches, 2);
    assert_eq!(report.validation.invalid_batches, 1);
    assert_eq!(report.transform.batches, 2);
    assert_eq!(report.transform.failed_batches, 0);
    assert_eq!(report.transform.clean_rows, 4);
    assert_eq!(report.transform.rejected_rows, 4);
    assert_eq!(report.load.files_loaded, 2);
    assert_eq!(report.load.tables_created, 3);

    let run_id = &report.run_id;
    let buckets = &env.config.buckets;
    let leh = DatasetKind::LoyaltyEarnedHourly;
    let purchases = DatasetKind::Purchases;

    // 原始区: 三个批次全部上传
    for (kind, seq) in [(leh, 1), (leh, 2), (purchases, 1)] {
        let key = remote_key(kind, &batch_file_name(kind, run_id, seq));
        assert!(env.object(&buckets.raw, &key).exists(), "缺少原始对象 {}", key);
    }

    // 结构校验失败的批次: 错误日志 + 原始文件进入 error 区，不进入 processed 区
    let broken = batch_file_name(leh, run_id, 2);
    let sv_log = env.object(
        &buckets.error,
        &remote_key(leh, &schema_error_file_name(leh, run_id)),
    );
    let sv_lines = read_lines(&sv_log);
    assert_eq!(sv_lines[0], "error");
    assert!(sv_lines
        .iter()
        .any(|l| l.contains("Column 'date' has incorrect data type")));
    assert!(env.object(&buckets.error, &remote_key(leh, &broken)).exists());
    assert!(!env.object(&buckets.processed, &remote_key(leh, &broken)).exists());

    // 数据质量错误: 按步骤顺序，每行只出现一次
    let dq_leh = read_lines(&env.object(
        &buckets.error,
        &remote_key(leh, &quality_error_file_name(leh, run_id)),
    ));
    assert_eq!(dq_leh[0], "date,userId,country,total_lp_earned,error_rule");
    assert_eq!(
        &dq_leh[1..],
        &[
            "2024-01-01 11:00:00,AB12cde,US,,missing_value".to_string(),
            "2024-01-01 11:00:00,AB12cde,FR,3,invalid_country".to_string(),
            "2024-01-01 10:00:00,EF56ghi,CA,-5,invalid_total_lp_earned".to_string(),
        ]
    );

    let dq_purchases = read_lines(&env.object(
        &buckets.error,
        &remote_key(purchases, &quality_error_file_name(purchases, run_id)),
    ));
    assert_eq!(dq_purchases.len(), 2);
    assert!(dq_purchases[1].ends_with(",invalid_user_id"));

    // 清洗后文件: 重复购买被静默丢弃，金额前缀已去除
    let processed = read_lines(&env.object(
        &buckets.processed,
        &remote_key(purchases, &batch_file_name(purchases, run_id, 1)),
    ));
    assert_eq!(
        processed,
        vec![
            "date,userId,revenue,transaction_id".to_string(),
            "2024-01-01 10:20:00,AB12cde,2.5,tx-1".to_string(),
            "2024-01-01 11:30:00,AB12cde,1.25,tx-2".to_string(),
        ]
    );

    // 数仓
    let conn = env.warehouse();
    assert_eq!(count_rows(&conn, "staging_loyalty_earned_hourly"), 2);
    assert_eq!(count_rows(&conn, "staging_purchases"), 2);
    assert_eq!(summary_rows(&env), expected_summary());
}

#[tokio::test]
async fn test_stage_by_stage_run_through_saved_context() {
    let env = TestEnv::new();
    let context_path = env.context_path();

    // 每个阶段使用新的 runner，模拟分进程执行
    {
        let runner = env.runner();
        let mut ctx = runner.start_run();
        let staged = runner
            .extract_workbooks(&sample_workbooks(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(staged, 3);
        save_context(&ctx, &context_path).unwrap();
    }
    {
        let runner = env.runner();
        let mut ctx = load_context(&context_path).unwrap();
        let summary = runner.validate(&mut ctx).await.unwrap();
        assert_eq!(summary.invalid_batches, 1);
        assert_eq!(ctx.validated_files.len(), 2);
        save_context(&ctx, &context_path).unwrap();
    }
    {
        let runner = env.runner();
        let mut ctx = load_context(&context_path).unwrap();
        let summary = runner.transform(&mut ctx).await.unwrap();
        assert_eq!(summary.clean_rows, 4);
        assert_eq!(ctx.processed_files.len(), 2);
        assert_eq!(ctx.quality_error_files.len(), 2);
        save_context(&ctx, &context_path).unwrap();
    }

    let runner = env.runner();
    let ctx = load_context(&context_path).unwrap();
    runner.load(&ctx).await.unwrap();
    let first = summary_rows(&env);
    assert_eq!(first, expected_summary());

    // 重复装载: staging 与汇总表均不重复
    runner.load(&ctx).await.unwrap();
    assert_eq!(summary_rows(&env), first);
    assert_eq!(count_rows(&env.warehouse(), "staging_purchases"), 2);
}

#[tokio::test]
async fn test_run_with_empty_input_dir_builds_empty_tables() {
    let env = TestEnv::new();
    let report = env.runner().run().await.unwrap();

    assert_eq!(report.extracted_batches, 0);
    assert_eq!(report.transform.files_uploaded, 0);
    assert_eq!(report.load.files_loaded, 0);

    let conn = env.warehouse();
    assert_eq!(count_rows(&conn, "staging_loyalty_earned_hourly"), 0);
    assert_eq!(count_rows(&conn, "hourly_daily_summary"), 0);
}

#[tokio::test]
async fn test_unrecognised_workbooks_produce_no_batches() {
    let env = TestEnv::new();
    let runner = env.runner();
    let workbooks = vec![workbook(
        "misc.xlsx",
        vec![
            sheet("notes", &["comment"], &[&["hello"]]),
            sheet(
                "partial",
                &["date", "userId", "country"],
                &[&["2024-01-01 10:00:00", "AB12cde", "US"]],
            ),
        ],
    )];

    let report = runner.run_workbooks(&workbooks).await.unwrap();
    assert_eq!(report.extracted_batches, 0);
    assert_eq!(report.validation.valid_batches, 0);
    assert_eq!(report.transform.batches, 0);
}

#[test]
fn test_excel_fixture_parses_every_sheet() {
    let workbook = ExcelParser
        .parse_workbook(&fixture_path("loyalty_export.xlsx"))
        .unwrap();

    let names: Vec<_> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["hourly", "notes"]);

    let hourly = &workbook.sheets[0];
    assert_eq!(hourly.columns, LEH_COLUMNS);
    // 第 3 行为空行，跳过
    let rows: Vec<_> = hourly
        .rows
        .iter()
        .map(|r| (r.row_number, r.cells.iter().flatten().cloned().collect::<Vec<_>>()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (2, vec!["2024-01-01 10:00:00".to_string(), "AB12cde".into(), "US".into(), "10".into()]),
            (4, vec!["2024-01-01 11:00:00".to_string(), "CD34efg".into(), "CA".into(), "7".into()]),
        ]
    );

    let notes = &workbook.sheets[1];
    assert_eq!(notes.columns, vec!["comment"]);
    assert_eq!(notes.rows[0].cells, vec![Some("exported by ops".to_string())]);
}

#[tokio::test]
async fn test_run_reads_workbooks_from_input_dir() {
    let env = TestEnv::new();
    std::fs::copy(
        fixture_path("loyalty_export.xlsx"),
        env.config.input_dir.join("loyalty_export.xlsx"),
    )
    .unwrap();

    let report = env.runner().run().await.unwrap();

    assert_eq!(report.extracted_batches, 1);
    assert_eq!(report.validation.invalid_batches, 0);
    assert_eq!(report.transform.clean_rows, 2);
    assert_eq!(report.transform.rejected_rows, 0);
    assert_eq!(
        count_rows(&env.warehouse(), "staging_loyalty_earned_hourly"),
        2
    );
    assert_eq!(count_rows(&env.warehouse(), "hourly_daily_summary"), 2);
}
