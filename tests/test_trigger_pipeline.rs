//! Integration tests: full primitive -> activity -> candidate pipelines
//!
//! Pipelines are built from JSON configuration exactly as a deployment would
//! hand them over, then driven one primitive at a time.
//!
//! Key integration points tested:
//! - Track finding feeding a multiplicity candidate maker
//! - Candidates completed mid-stream versus released by flush
//! - Prescale on both stages
//! - Photon-detector clustering on both stages
//! - Pre-filter and telemetry through the public API
//! - Configuration failures surfacing from `from_config`

#[cfg(test)]
mod trigger_pipeline_tests {
    use serde_json::json;
    use triggerflow::{
        ActivityAlgorithm, CandidateAlgorithm, CandidateType, Channel, ConfigError, Primitive, PrimitiveKind,
        Timestamp, TriggerPipeline,
    };

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn make_primitive(time_start: Timestamp, channel: Channel) -> Primitive {
        Primitive {
            time_start,
            time_over_threshold: 10,
            time_peak: time_start + 4,
            channel,
            adc_integral: 120,
            adc_peak: 40,
            detid: 3,
            kind: PrimitiveKind::Tpc,
        }
    }

    /// Ten adjacent channels starting at `first_channel`, 10 ticks apart
    fn make_track(time_start: Timestamp, first_channel: Channel) -> Vec<Primitive> {
        (0..10)
            .map(|i| make_primitive(time_start + u64::from(i) * 10, first_channel + i))
            .collect()
    }

    fn track_pipeline() -> TriggerPipeline {
        TriggerPipeline::from_config(&json!({
            "activity_maker": {
                "algorithm": "channel_time_adjacency",
                "window_length": 1_000,
                "adjacency_threshold": 5
            },
            "candidate_maker": {
                "algorithm": "n_channel_hits",
                "window_length": 10_000,
                "n_channels_threshold": 8,
                "readout_window_ticks_before": 50,
                "readout_window_ticks_after": 500
            }
        }))
        .expect("valid pipeline config")
    }

    fn run(pipeline: &mut TriggerPipeline, primitives: &[Primitive]) -> Vec<triggerflow::Candidate> {
        primitives
            .iter()
            .flat_map(|tp| pipeline.process_primitive(tp))
            .collect()
    }

    #[test]
    fn test_tracks_become_candidate_on_flush() {
        init_logger();
        let mut pipeline = track_pipeline();

        let mut stream = make_track(0, 100);
        stream.extend(make_track(3_000, 300));
        // Lone hit closes the second track's window
        stream.push(make_primitive(6_000, 1));

        // Both tracks found, but the candidate window is still open
        assert!(run(&mut pipeline, &stream).is_empty());
        assert_eq!(pipeline.stats().activities, 2);

        let candidates = pipeline.flush(Timestamp::MAX);
        assert_eq!(candidates.len(), 1);

        let tc = &candidates[0];
        assert_eq!(tc.time_start, 0, "readout start clamps at zero");
        assert_eq!(tc.time_end, 500);
        assert_eq!(tc.time_candidate, 0);
        assert_eq!(tc.detid, 3);
        assert_eq!(tc.candidate_type, CandidateType::NChannelHits);
        assert_eq!(tc.algorithm, CandidateAlgorithm::NChannelHits);
        assert_eq!(tc.inputs.len(), 2);
        assert_eq!(tc.inputs[0].channel_start, 100);
        assert_eq!(tc.inputs[0].channel_end, 109);
        assert_eq!(tc.inputs[1].time_start, 3_000);
        assert_eq!(tc.inputs[1].adc_integral, 1_200);
        assert!(tc
            .inputs
            .iter()
            .all(|ta| ta.algorithm == ActivityAlgorithm::ChannelTimeAdjacency));
    }

    #[test]
    fn test_candidate_completed_mid_stream() {
        init_logger();
        let mut pipeline = track_pipeline();

        let mut stream = make_track(0, 100);
        stream.extend(make_track(3_000, 300));
        stream.push(make_primitive(6_000, 1));
        stream.extend(make_track(20_000, 500));
        assert!(run(&mut pipeline, &stream).is_empty());

        // Closing the third track pushes its activity past the candidate window
        let out = pipeline.process_primitive(&make_primitive(25_000, 1));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].inputs.len(), 2);
        assert_eq!(out[0].time_candidate, 0);

        // Third track alone still has 10 distinct channels
        let tail = pipeline.flush(Timestamp::MAX);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].time_candidate, 20_000);
        assert_eq!(tail[0].time_start, 19_950);
        assert_eq!(tail[0].time_end, 20_500);

        let stats = pipeline.stats();
        assert_eq!(stats.primitives_in, 32);
        assert_eq!(stats.activities, 3);
        assert_eq!(stats.candidates, 2);
    }

    #[test]
    fn test_flush_until_discards_late_windows() {
        init_logger();
        let mut pipeline = track_pipeline();

        run(&mut pipeline, &make_track(1_000, 100));

        // Open track window starts after `until`: dropped, not emitted
        assert!(pipeline.flush(500).is_empty());
        assert_eq!(pipeline.stats().activities, 0);

        // Nothing left behind for a later flush
        assert!(pipeline.flush(Timestamp::MAX).is_empty());
        assert_eq!(pipeline.stats().flushes, 2);
    }

    #[test]
    fn test_prescale_on_both_stages() {
        init_logger();
        let mut pipeline = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "prescale", "prescale": 2 },
            "candidate_maker": { "algorithm": "prescale", "prescale": 2 }
        }))
        .unwrap();

        let stream: Vec<Primitive> = (1..=8).map(|t| make_primitive(t * 100, 7)).collect();
        let candidates = run(&mut pipeline, &stream);

        // Activities 2, 4, 6, 8 survive, then every second of those
        let times: Vec<Timestamp> = candidates.iter().map(|tc| tc.time_start).collect();
        assert_eq!(times, vec![400, 800]);
        assert_eq!(pipeline.stats().activities, 4);
    }

    #[test]
    fn test_max_tot_filters_before_telemetry() {
        init_logger();
        let mut pipeline = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "prescale", "max_tot": 50 },
            "candidate_maker": { "algorithm": "adc_simple_window", "tc_type_name": "supernova" }
        }))
        .unwrap();

        let mut long = make_primitive(100, 9);
        long.time_over_threshold = 80;

        assert!(pipeline.process_primitive(&long).is_empty());
        let out = pipeline.process_primitive(&make_primitive(200, 9));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].candidate_type, CandidateType::Supernova);
        assert_eq!(out[0].time_candidate, 204);
        assert_eq!(pipeline.stats().primitives_in, 2);
        assert_eq!(pipeline.activity_telemetry().items_seen(), 1);
    }

    #[test]
    fn test_photon_detector_clusters() {
        init_logger();
        let mut pipeline = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "pds_time_clustering", "adc_threshold": 300 },
            "candidate_maker": { "algorithm": "pds_time_clustering" }
        }))
        .expect("valid pipeline config");

        let stream: Vec<Primitive> = [0, 20, 40, 1_000]
            .into_iter()
            .map(|t| Primitive {
                kind: PrimitiveKind::Pds,
                ..make_primitive(t, 2)
            })
            .collect();

        let candidates = run(&mut pipeline, &stream);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].time_start, 0);
        assert_eq!(candidates[0].time_end, 50);
        assert_eq!(candidates[0].time_candidate, 44);
        assert_eq!(candidates[0].candidate_type, CandidateType::PdsTimeClustering);
        assert_eq!(candidates[0].inputs[0].algorithm, ActivityAlgorithm::PdsTimeClustering);
        assert_eq!(candidates[0].inputs[0].adc_integral, 360);

        // The lone hit at 1000 carries too little charge
        assert!(pipeline.flush(Timestamp::MAX).is_empty());
    }

    #[test]
    fn test_configuration_errors() {
        init_logger();

        let unknown = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "bragg_peak" },
            "candidate_maker": { "algorithm": "prescale" }
        }));
        assert_eq!(
            unknown.err(),
            Some(ConfigError::UnknownAlgorithm("bragg_peak".to_string()))
        );

        let zero_prescale = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "prescale", "prescale": 0 },
            "candidate_maker": { "algorithm": "prescale" }
        }));
        assert!(matches!(zero_prescale, Err(ConfigError::OutOfRange { .. })));

        let bad_type = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "prescale" },
            "candidate_maker": { "algorithm": "prescale", "tc_type_name": "unknown" }
        }));
        assert!(matches!(bad_type, Err(ConfigError::UnknownCandidateType(_))));

        let conflict = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "prescale" },
            "candidate_maker": {
                "algorithm": "horizontal_muon",
                "trigger_on_adc": true,
                "trigger_on_n_channels": true
            }
        }));
        assert!(matches!(conflict, Err(ConfigError::Conflict(_))));

        let wrong_type = TriggerPipeline::from_config(&json!({
            "activity_maker": { "algorithm": "n_channel_hits", "window_length": "long" },
            "candidate_maker": { "algorithm": "prescale" }
        }));
        assert!(matches!(wrong_type, Err(ConfigError::WrongType { .. })));
    }
}
