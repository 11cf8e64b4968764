// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bindings for the rewards tree contract.

alloy::sol! {
    #[sol(rpc, all_derives)]
    interface IBadgerTreeV2 {
        struct MerkleData {
            bytes32 root;
            bytes32 contentHash;
            uint256 startBlock;
            uint256 endBlock;
            uint256 timestamp;
            uint256 blockNumber;
        }

        event RootUpdated(
            uint256 indexed cycle,
            bytes32 indexed root,
            bytes32 indexed contentHash,
            uint256 startBlock,
            uint256 endBlock,
            uint256 timestamp,
            uint256 blockNumber
        );

        function currentCycle() external view returns (uint256);

        function getCurrentMerkleData() external view returns (MerkleData memory);
    }
}
