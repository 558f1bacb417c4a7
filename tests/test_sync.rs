#[cfg(feature = "blocking")]
mod common;

#[cfg(feature = "blocking")]
mod test_sync {
    use crate::common::{MockServer, Session};
    use adbhost::sync::{self, SYNC_DATA_MAX};
    use adbhost::AdbError;
    use std::collections::HashMap;
    use std::io::{Cursor, Write};
    use std::sync::{Arc, Mutex};
    use std::time::UNIX_EPOCH;
    use tempfile::NamedTempFile;

    #[derive(Debug, Clone, Default)]
    struct Capture {
        payload: String,
        frames: Vec<Vec<u8>>,
        mtime: u32,
    }

    type Store = Arc<Mutex<HashMap<String, Capture>>>;

    fn put_u32(data: &mut Vec<u8>, value: u32) {
        data.extend_from_slice(&value.to_le_bytes());
    }

    fn dent(name: &str, mode: u32, size: u32, mtime: u32) -> Vec<u8> {
        let mut data = b"DENT".to_vec();
        put_u32(&mut data, mode);
        put_u32(&mut data, size);
        put_u32(&mut data, mtime);
        put_u32(&mut data, name.len() as u32);
        data.extend_from_slice(name.as_bytes());
        data
    }

    fn serve_sync(session: &mut Session, serial: &str, store: &Store) {
        let Some((tag, payload)) = session.read_sync_request() else { return };
        let path = String::from_utf8_lossy(&payload).to_string();
        match tag.as_str() {
            "SEND" => {
                let mut capture = Capture {
                    payload: path.clone(),
                    ..Capture::default()
                };
                loop {
                    let Some(frame_tag) = session.read_bytes(4) else { return };
                    let Some(length) = session.read_le_u32() else { return };
                    if frame_tag == b"DATA" {
                        let Some(data) = session.read_bytes(length as usize) else { return };
                        capture.frames.push(data);
                    } else {
                        assert_eq!(frame_tag, b"DONE");
                        capture.mtime = length;
                        break;
                    }
                }
                store.lock().unwrap().insert(serial.to_string(), capture);
                if path.starts_with("/denied") {
                    session.sync_fail("Permission denied");
                } else {
                    session.sync_okay();
                }
            }
            "LIST" if path == "/bogus" => {
                let mut data = b"DENT".to_vec();
                for value in [0o100644, 1, 1_700_000_000, 1 << 20] {
                    put_u32(&mut data, value);
                }
                session.raw(&data);
            }
            "LIST" => {
                let mut data = dent(".", 0o040771, 4096, 1_700_000_000);
                data.extend(dent("a.txt", 0o100644, 12, 1_700_000_100));
                data.extend(dent("link", 0o120777, 7, 1_700_000_200));
                data.extend_from_slice(b"DONE");
                data.extend_from_slice(&[0u8; 16]);
                session.raw(&data);
            }
            "STAT" => {
                let mut data = b"STAT".to_vec();
                put_u32(&mut data, 0o100644);
                put_u32(&mut data, 11);
                put_u32(&mut data, 1_700_000_300);
                session.raw(&data);
            }
            "RECV" if path == "/missing" => session.sync_fail("No such file or directory"),
            "RECV" if path == "/oversized" => {
                let mut data = b"DATA".to_vec();
                put_u32(&mut data, SYNC_DATA_MAX as u32 + 1);
                session.raw(&data);
            }
            "RECV" => {
                let mut data = Vec::new();
                for chunk in ["hello ", "world"] {
                    data.extend_from_slice(b"DATA");
                    put_u32(&mut data, chunk.len() as u32);
                    data.extend_from_slice(chunk.as_bytes());
                }
                data.extend_from_slice(b"DONE");
                put_u32(&mut data, 0);
                session.raw(&data);
            }
            _ => session.sync_fail("unknown sync request"),
        }
    }

    fn sync_server() -> (MockServer, Store) {
        let store: Store = Arc::new(Mutex::new(HashMap::new()));
        let captures = store.clone();
        let server = MockServer::start(move |mut session| {
            let Some(request) = session.read_request() else { return };
            let Some(serial) = request.strip_prefix("host:transport:").map(str::to_string) else {
                session.fail("unknown host service");
                return;
            };
            session.okay();
            assert_eq!(session.read_request().as_deref(), Some("sync:"));
            session.okay();
            serve_sync(&mut session, &serial, &captures);
        });
        (server, store)
    }

    #[test]
    fn test_push_broadcasts_identical_frames() {
        let (server, store) = sync_server();
        let client = server.client();
        let devices = vec![client.device("phone-a"), client.device("phone-b")];

        let content: Vec<u8> = (0..70000u32).map(|i| (i % 253) as u8).collect();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&content).unwrap();
        file.flush().unwrap();
        let mtime = std::fs::metadata(file.path())
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;

        sync::push_devices(&devices, file.path(), "/data/local/tmp/blob").unwrap();

        let store = store.lock().unwrap();
        let a = &store["phone-a"];
        let b = &store["phone-b"];
        assert_eq!(a.frames, b.frames);
        let lengths: Vec<usize> = a.frames.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![SYNC_DATA_MAX, 4464]);
        assert_eq!(a.frames.concat(), content);
        assert_eq!(a.mtime, mtime);

        let (path, mode) = a.payload.rsplit_once(',').unwrap();
        assert_eq!(path, "/data/local/tmp/blob");
        assert!(mode.parse::<u32>().unwrap() <= 0o777);
    }

    #[test]
    fn test_push_reader_explicit_mode_and_mtime() {
        let (server, store) = sync_server();
        let device = server.client().device("phone-a");
        let data = vec![9u8; SYNC_DATA_MAX];
        sync::push_reader(
            std::slice::from_ref(&device),
            Cursor::new(data),
            "/sdcard/x",
            0o755,
            1234,
        )
        .unwrap();

        let store = store.lock().unwrap();
        let capture = &store["phone-a"];
        assert_eq!(capture.payload, "/sdcard/x,493");
        assert_eq!(capture.frames.len(), 1);
        assert_eq!(capture.mtime, 1234);
    }

    #[test]
    fn test_push_failure_status() {
        let (server, _) = sync_server();
        let device = server.client().device("phone-a");
        let err = sync::push_reader(
            std::slice::from_ref(&device),
            Cursor::new(b"data".to_vec()),
            "/denied/file",
            0o644,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AdbError::SyncFailed { ref path, ref message }
                if path == "/denied/file" && message == "Permission denied"
        ));
    }

    #[test]
    fn test_push_unknown_target_fails_whole_push() {
        let (server, store) = sync_server();
        let client = server.client().with_transport(adbhost::Transport::Usb);
        let err = sync::push_reader(
            std::slice::from_ref(&client),
            Cursor::new(b"data".to_vec()),
            "/sdcard/x",
            0o644,
            0,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "PROTOCOL_ERROR");
        assert!(store.lock().unwrap().is_empty());
    }

    #[test]
    fn test_list_directory() {
        let (server, _) = sync_server();
        let device = server.client().device("phone-a");
        let entries = sync::list(&device, "/sdcard").unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_dir());
        assert_eq!(entries[1].path, "a.txt");
        assert!(entries[1].is_file());
        assert_eq!(entries[1].size, 12);
        assert!(entries[2].is_symlink());
    }

    #[test]
    fn test_stat_and_pull() {
        let (server, _) = sync_server();
        let device = server.client().device("phone-a");

        let info = sync::stat(&device, "/sdcard/hello.txt").unwrap();
        assert!(info.is_file());
        assert_eq!(info.size, 11);
        assert_eq!(info.path, "/sdcard/hello.txt");

        let mut out = Vec::new();
        let size = sync::pull(&device, "/sdcard/hello.txt", &mut out).unwrap();
        assert_eq!(size, 11);
        assert_eq!(out, b"hello world");

        let err = sync::pull(&device, "/missing", &mut out).unwrap_err();
        assert_eq!(err.error_code(), "SYNC_FAILED");
    }

    #[test]
    fn test_pull_rejects_oversized_data_frame() {
        let (server, _) = sync_server();
        let device = server.client().device("phone-a");
        let mut out = Vec::new();
        let err = sync::pull(&device, "/oversized", &mut out).unwrap_err();
        assert_eq!(err.error_code(), "PROTOCOL_ERROR");
        assert!(out.is_empty());
    }

    #[test]
    fn test_list_rejects_oversized_entry_name() {
        let (server, _) = sync_server();
        let device = server.client().device("phone-a");
        let err = sync::list(&device, "/bogus").unwrap_err();
        assert_eq!(err.error_code(), "PROTOCOL_ERROR");
    }
}
